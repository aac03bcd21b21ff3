//! Chart the records written by the `benchmark` binary.
//!
//! Run with:
//! ```bash
//! cargo run --bin plot -- --input results.csv --output runtime_plot.svg
//! ```

use clap::Parser;
use dh_psi_examples::bench::read_results;
use dh_psi_examples::plot::plot_runtime;
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Plot DH-based PSI runtime against set size")]
struct Args {
    /// Records written by the benchmark binary
    #[arg(long, default_value = "results.csv")]
    input: PathBuf,

    /// Where to write the SVG chart
    #[arg(long, default_value = "runtime_plot.svg")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_timed();
    let args = Args::parse();

    let records = read_results(BufReader::new(File::open(&args.input)?))?;
    info!("loaded {} records from {}", records.len(), args.input.display());

    println!("Loaded data:");
    for record in &records {
        println!(
            "  n = {:6}, avg runtime = {:.6} s",
            record.set_size, record.avg_runtime_seconds
        );
    }

    plot_runtime(&records, &args.output)?;
    println!("\nChart written to {}", args.output.display());
    Ok(())
}
