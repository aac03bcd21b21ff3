//! In-memory example of PSI protocol execution.
//!
//! This example runs the protocol within a single process, first step by
//! step on a small fixed pair of sets, then on random sets checked against
//! the plain intersection.
//!
//! Run with:
//! ```bash
//! cargo run --bin in_memory -- --size 50 --overlap 10
//! ```

use clap::Parser;
use dh_psi::{GroupParameters, PsiSession};
use dh_psi_examples::bench::run_once;
use dh_psi_examples::sets::generate_random_sets;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser, Debug)]
#[command(about = "Run DH-based PSI between two in-process parties")]
struct Args {
    /// Elements per party in the random-set check
    #[arg(long, default_value_t = 50)]
    size: usize,

    /// Shared elements in the random-set check
    #[arg(long, default_value_t = 10)]
    overlap: usize,

    /// Seed for set generation and secrets; OS entropy if absent
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_timed();
    let args = Args::parse();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let params = GroupParameters::reference();

    println!("=== PSI Protocol In-Memory Example ===\n");

    let alice_items = ["a1", "a2", "a3", "common1", "common2"];
    let bob_items = ["b1", "common1", "common2", "b2"];

    println!("Alice's items ({}):", alice_items.len());
    for (i, item) in alice_items.iter().enumerate() {
        println!("  {}: {}", i + 1, item);
    }
    println!("\nBob's items ({}):", bob_items.len());
    for (i, item) in bob_items.iter().enumerate() {
        println!("  {}: {}", i + 1, item);
    }

    println!("\n--- Init ---");
    let mut session = PsiSession::from_sets(&params, alice_items, bob_items, &mut rng)?;
    println!("Phase: {}", session.phase());

    println!("\n--- First round: blind and exchange ---");
    session.exchange_first_round()?;
    println!("Phase: {}", session.phase());

    println!("\n--- Second round: reblind and return ---");
    session.exchange_second_round()?;
    println!("Phase: {}", session.phase());

    println!("\n--- Intersection ---");
    let result = session.compute_intersection()?;
    for (i, element) in result.iter().enumerate() {
        println!("  {}: {}", i + 1, element);
    }
    let result = session.finish()?;
    println!("Intersection size: {} (expected: 2)", result.len());

    println!("\n\n=== Random Sets Check ===\n");
    let (set_a, set_b) = generate_random_sets(args.size, args.overlap, &mut rng)?;
    println!("Alice: {} items, Bob: {} items", set_a.len(), set_b.len());

    let outcome = run_once(&params, &set_a, &set_b, &mut rng)?;
    println!("True intersection size: {}", outcome.real.len());
    println!("PSI intersection size : {}", outcome.computed.len());
    println!("Protocol time: {:.6} s", outcome.elapsed.as_secs_f64());

    if outcome.is_correct() {
        println!("\n✓ Computed intersection matches the true intersection");
        Ok(())
    } else {
        Err("computed intersection differs from the true intersection".into())
    }
}
