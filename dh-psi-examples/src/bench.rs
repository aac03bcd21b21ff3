//! Timing harness for repeated protocol runs.
//!
//! Results are stored as comma-separated records, one per set size, under
//! the header `set_size,overlap_size,avg_runtime_seconds`.

use crate::sets::{generate_random_sets, SetGenError};
use dh_psi::{GroupParameters, PsiError, PsiSession};
use log::{debug, info};
use rand::{CryptoRng, RngCore};
use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::time::{Duration, Instant};
use thiserror::Error;

pub const CSV_HEADER: &str = "set_size,overlap_size,avg_runtime_seconds";

#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Psi(#[from] PsiError),

    #[error(transparent)]
    SetGen(#[from] SetGenError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wrong intersection at size {set_size}: {computed} computed, {expected} true")]
    IntersectionMismatch {
        set_size: usize,
        expected: usize,
        computed: usize,
    },

    #[error("invalid benchmark configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed record on line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// One protocol run checked against the plain intersection.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub real: BTreeSet<String>,
    pub computed: BTreeSet<String>,
    /// Time spent in the protocol, from the first round to the result.
    /// Party construction (secret generation) is not counted.
    pub elapsed: Duration,
}

impl RunOutcome {
    pub fn is_correct(&self) -> bool {
        self.real == self.computed
    }
}

/// Run the protocol once on `set_a` and `set_b` and time it.
pub fn run_once<R: RngCore + CryptoRng>(
    params: &GroupParameters,
    set_a: &BTreeSet<String>,
    set_b: &BTreeSet<String>,
    rng: &mut R,
) -> Result<RunOutcome, BenchError> {
    let session =
        PsiSession::from_sets(params, set_a.iter().cloned(), set_b.iter().cloned(), rng)?;

    let start = Instant::now();
    let computed = session.run()?.into_set();
    let elapsed = start.elapsed();

    let real = set_a.intersection(set_b).cloned().collect();
    Ok(RunOutcome {
        real,
        computed,
        elapsed,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub sizes: Vec<usize>,
    /// Fraction of each set shared with the other, in `[0, 1]`.
    pub overlap_ratio: f64,
    /// Runs per size; each run uses fresh sets and fresh secrets.
    pub runs: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            sizes: vec![100, 500, 1000, 3000, 5000, 10000],
            overlap_ratio: 0.1,
            runs: 5,
        }
    }
}

impl BenchConfig {
    fn validate(&self) -> Result<(), BenchError> {
        if !(0.0..=1.0).contains(&self.overlap_ratio) {
            return Err(BenchError::InvalidConfig(format!(
                "overlap ratio must lie in [0, 1], got {}",
                self.overlap_ratio
            )));
        }
        if self.runs == 0 {
            return Err(BenchError::InvalidConfig(
                "at least one run per size is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn overlap_for(&self, size: usize) -> usize {
        (size as f64 * self.overlap_ratio) as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchRecord {
    pub set_size: usize,
    pub overlap_size: usize,
    pub avg_runtime_seconds: f64,
}

impl BenchRecord {
    fn parse(line_no: usize, line: &str) -> Result<Self, BenchError> {
        let parse_err = |message: String| BenchError::Parse {
            line: line_no,
            message,
        };
        let fields: Vec<&str> = line.trim().split(',').collect();
        if fields.len() != 3 {
            return Err(parse_err(format!("expected 3 fields, found {}", fields.len())));
        }
        Ok(Self {
            set_size: fields[0]
                .parse()
                .map_err(|e| parse_err(format!("set_size: {}", e)))?,
            overlap_size: fields[1]
                .parse()
                .map_err(|e| parse_err(format!("overlap_size: {}", e)))?,
            avg_runtime_seconds: fields[2]
                .parse()
                .map_err(|e| parse_err(format!("avg_runtime_seconds: {}", e)))?,
        })
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(
            out,
            "{},{},{}",
            self.set_size, self.overlap_size, self.avg_runtime_seconds
        )
    }
}

/// Time `config.runs` runs for every configured size and write one record
/// per size to `out`, header first.
///
/// # Errors
/// Stops at the first run whose computed intersection differs from the true
/// one, returning `BenchError::IntersectionMismatch`.
pub fn benchmark<R, W>(
    config: &BenchConfig,
    params: &GroupParameters,
    rng: &mut R,
    mut out: W,
) -> Result<Vec<BenchRecord>, BenchError>
where
    R: RngCore + CryptoRng,
    W: Write,
{
    config.validate()?;
    writeln!(out, "{}", CSV_HEADER)?;

    let mut records = Vec::with_capacity(config.sizes.len());
    for &size in &config.sizes {
        let overlap = config.overlap_for(size);
        let mut total = Duration::ZERO;

        for run in 0..config.runs {
            let (set_a, set_b) = generate_random_sets(size, overlap, rng)?;
            let outcome = run_once(params, &set_a, &set_b, rng)?;
            if !outcome.is_correct() {
                return Err(BenchError::IntersectionMismatch {
                    set_size: size,
                    expected: outcome.real.len(),
                    computed: outcome.computed.len(),
                });
            }
            debug!("size {} run {}: {:?}", size, run, outcome.elapsed);
            total += outcome.elapsed;
        }

        let record = BenchRecord {
            set_size: size,
            overlap_size: overlap,
            avg_runtime_seconds: total.as_secs_f64() / config.runs as f64,
        };
        info!(
            "size {} overlap {}: {:.6} s average",
            size, overlap, record.avg_runtime_seconds
        );
        record.write_to(&mut out)?;
        records.push(record);
    }
    out.flush()?;

    Ok(records)
}

/// Read records written by [`benchmark`], skipping the header line.
pub fn read_results<R: BufRead>(reader: R) -> Result<Vec<BenchRecord>, BenchError> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate().skip(1) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(BenchRecord::parse(index + 1, &line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::thread;

    /// Seeded generator that stalls on every draw.
    struct SlowRng(StdRng);

    const STALL: Duration = Duration::from_millis(100);

    impl RngCore for SlowRng {
        fn next_u32(&mut self) -> u32 {
            thread::sleep(STALL);
            self.0.next_u32()
        }

        fn next_u64(&mut self) -> u64 {
            thread::sleep(STALL);
            self.0.next_u64()
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            thread::sleep(STALL);
            self.0.fill_bytes(dest)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            thread::sleep(STALL);
            self.0.try_fill_bytes(dest)
        }
    }

    impl CryptoRng for SlowRng {}

    #[test]
    fn test_run_once_is_correct() {
        let mut rng = StdRng::seed_from_u64(1);
        let (a, b) = generate_random_sets(50, 10, &mut rng).unwrap();
        let outcome = run_once(&GroupParameters::reference(), &a, &b, &mut rng).unwrap();
        assert!(outcome.is_correct());
        assert_eq!(outcome.computed.len(), 10);
    }

    #[test]
    fn test_run_once_excludes_party_construction() {
        // Both secrets and both shuffles draw from the stalling generator,
        // so construction alone takes at least 2 * STALL.
        let a: BTreeSet<String> = ["a1", "a2", "shared"].map(String::from).into_iter().collect();
        let b: BTreeSet<String> = ["b1", "shared"].map(String::from).into_iter().collect();
        let mut rng = SlowRng(StdRng::seed_from_u64(4));

        let started = Instant::now();
        let outcome = run_once(&GroupParameters::reference(), &a, &b, &mut rng).unwrap();
        let total = started.elapsed();

        assert!(outcome.is_correct());
        assert!(total >= STALL * 2);
        assert!(outcome.elapsed < STALL * 2, "timed {:?}", outcome.elapsed);
    }

    #[test]
    fn test_benchmark_writes_records() {
        let config = BenchConfig {
            sizes: vec![10, 20],
            overlap_ratio: 0.5,
            runs: 2,
        };
        let mut rng = StdRng::seed_from_u64(2);
        let mut out = Vec::new();
        let params = GroupParameters::reference();
        let records = benchmark(&config, &params, &mut rng, &mut out).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].set_size, 10);
        assert_eq!(records[0].overlap_size, 5);
        assert_eq!(records[1].overlap_size, 10);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert!(lines.next().unwrap().starts_with("10,5,"));
        assert!(lines.next().unwrap().starts_with("20,10,"));
        assert_eq!(lines.next(), None);

        let parsed = read_results(text.as_bytes()).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_benchmark_rejects_bad_config() {
        let mut rng = StdRng::seed_from_u64(3);
        let params = GroupParameters::reference();
        let bad_ratio = BenchConfig {
            overlap_ratio: 1.5,
            ..BenchConfig::default()
        };
        assert!(matches!(
            benchmark(&bad_ratio, &params, &mut rng, Vec::new()),
            Err(BenchError::InvalidConfig(_))
        ));

        let no_runs = BenchConfig {
            runs: 0,
            ..BenchConfig::default()
        };
        assert!(matches!(
            benchmark(&no_runs, &params, &mut rng, Vec::new()),
            Err(BenchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_overlap_rounds_down() {
        let config = BenchConfig::default();
        assert_eq!(config.overlap_for(105), 10);
        assert_eq!(config.overlap_for(5), 0);
    }

    #[test]
    fn test_read_results_errors() {
        let text = "set_size,overlap_size,avg_runtime_seconds\n100,10\n";
        assert!(matches!(
            read_results(text.as_bytes()),
            Err(BenchError::Parse { line: 2, .. })
        ));

        let text = "set_size,overlap_size,avg_runtime_seconds\n100,ten,0.5\n";
        assert!(matches!(
            read_results(text.as_bytes()),
            Err(BenchError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_read_results_skips_blank_lines() {
        let text = "set_size,overlap_size,avg_runtime_seconds\n100,10,0.25\n\n500,50,1.5\n";
        let records = read_results(text.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![
                BenchRecord {
                    set_size: 100,
                    overlap_size: 10,
                    avg_runtime_seconds: 0.25
                },
                BenchRecord {
                    set_size: 500,
                    overlap_size: 50,
                    avg_runtime_seconds: 1.5
                },
            ]
        );
    }
}
