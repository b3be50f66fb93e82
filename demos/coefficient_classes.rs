use ascon_anf::{nonce_misuse_with_condition, Permutation, Tracking, Variable};

fn main() {
    env_logger::init();

    let primary = 0;
    let perm = Permutation::ascon();
    let run = Tracking::new(
        nonce_misuse_with_condition(perm.width(), primary).expect("bad setting"),
        primary,
        None,
    );
    let report = run.run(&perm).expect("tracking failed");
    let summary = &report.analysis;

    println!("Primary variable: v{}, condition a{} = 0", primary, primary);
    println!("  never multiplied:        {}", report.never_coupled.len());
    println!("  multiplied:              {}", report.coupled.len());
    println!("  constant coefficient:    {}", summary.unconditionally_present().len());
    println!("  complementary pair:      {:?}", summary.complementary_pairs());
    println!("  common divisor:          {:?}", summary.common_divisors());
    println!(
        "    divisible by e{}:       {:?}",
        primary,
        summary.divisible_by(Variable::error(primary as u16))
    );
    println!("  irreducible:             {:?}", summary.irreducible());

    for i in summary.common_divisors() {
        let rec = &report.records[&i];
        let coeffs: Vec<String> = rec.coefficients.iter().map(|p| p.to_string()).collect();
        if let Some(d) = summary.divisor(i) {
            println!("    {:>2}: [{}] -> {}", i, coeffs.join(", "), d);
        }
    }

    let json = serde_json::to_string_pretty(summary).expect("serialization failed");
    println!("{}", json);
}
