use ascon_anf::{ldw17_cubes, Permutation, ASCON_128_IV};

fn main() {
    env_logger::init();

    // An all-zero IV over-estimates the diffusion of each variable through
    // the first S-box layer; pass "zero" to use it.
    let iv = match std::env::args().nth(1).as_deref() {
        Some("zero") => 0,
        _ => ASCON_128_IV,
    };

    let perm = Permutation::ascon();
    for cube in ldw17_cubes() {
        let report = cube
            .tracking(iv)
            .and_then(|run| run.run(&perm))
            .expect("tracking failed");
        let (via_target, never) = report.conditional_cube_candidates(&cube.shifted().cube);
        println!("Cube: {} (primary v{}, target row {})", cube.name, cube.primary(), cube.target_row);
        println!(
            "  only from target row: {} {:?}",
            report.coupled_only_from_target_row.len(),
            report.coupled_only_from_target_row
        );
        println!("  never multiplied:     {} {:?}", report.never_coupled.len(), report.never_coupled);
        println!("  cube members: {} {:?} / {} {:?}", via_target.len(), via_target, never.len(), never);
    }
}
