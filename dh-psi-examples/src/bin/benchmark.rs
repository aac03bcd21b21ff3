//! Runtime benchmark of the PSI protocol.
//!
//! For each set size the protocol runs several times on fresh random sets
//! (and fresh secrets). The average runtime per size is printed as a table
//! and written to a CSV file with the header
//! `set_size,overlap_size,avg_runtime_seconds`.
//!
//! Run with:
//! ```bash
//! cargo run --release --bin benchmark -- --sizes 100,500,1000 --runs 5
//! cargo run --release --bin benchmark -- --summarize results.csv
//! ```

use clap::Parser;
use dh_psi::GroupParameters;
use dh_psi_examples::bench::{benchmark, read_results, BenchConfig, BenchRecord};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Time DH-based PSI over a range of set sizes")]
struct Args {
    /// Set sizes to measure, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = [100usize, 500, 1000, 3000, 5000, 10000])]
    sizes: Vec<usize>,

    /// Fraction of each set shared with the other
    #[arg(long, default_value_t = 0.1)]
    overlap_ratio: f64,

    /// Runs per set size
    #[arg(long, default_value_t = 5)]
    runs: usize,

    /// Where to write the results
    #[arg(long, default_value = "results.csv")]
    output: PathBuf,

    /// Seed for set generation and secrets; OS entropy if absent
    #[arg(long)]
    seed: Option<u64>,

    /// Print the records of an earlier run instead of benchmarking
    #[arg(long, value_name = "CSV")]
    summarize: Option<PathBuf>,
}

fn print_table(records: &[BenchRecord]) {
    println!("{:>10} | {:>10} | {:>18}", "Set size", "Overlap", "Avg runtime (s)");
    println!("{}", "-".repeat(44));
    for record in records {
        println!(
            "{:>10} | {:>10} | {:>18.6}",
            record.set_size, record.overlap_size, record.avg_runtime_seconds
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_timed();
    let args = Args::parse();

    if let Some(path) = args.summarize {
        let records = read_results(BufReader::new(File::open(&path)?))?;
        println!("Loaded {} records from {}", records.len(), path.display());
        print_table(&records);
        return Ok(());
    }

    let config = BenchConfig {
        sizes: args.sizes,
        overlap_ratio: args.overlap_ratio,
        runs: args.runs,
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    println!("==========================");
    println!("   DH-PSI Runtime Test");
    println!("==========================");
    println!(
        "{} runs per size, overlap ratio {}\n",
        config.runs, config.overlap_ratio
    );

    let out = BufWriter::new(File::create(&args.output)?);
    let records = benchmark(&config, &GroupParameters::reference(), &mut rng, out)?;

    print_table(&records);
    println!("\nResults written to {}", args.output.display());
    Ok(())
}
