//! Drivers around the `dh-psi` protocol: test-set generation, a timing
//! harness whose results are stored as `set_size,overlap_size,avg_runtime_seconds`
//! records, and a runtime chart of those records.

pub mod bench;
pub mod plot;
pub mod sets;
