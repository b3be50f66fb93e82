use ascon_anf::{nonce_misuse_sets, Permutation};

fn main() {
    env_logger::init();

    // can be any index in 0..64; the sets shift cyclically with it
    let primary = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(0);

    let perm = Permutation::ascon();
    let sets = nonce_misuse_sets(&perm, primary).expect("tracking failed");
    for (i, s) in sets.iter().enumerate() {
        println!("S{} {} {:?}", i, s.len(), s);
    }
}
