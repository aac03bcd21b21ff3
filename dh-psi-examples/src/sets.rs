//! Random element sets with a controlled overlap.

use rand::RngCore;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetGenError {
    #[error("overlap {overlap} exceeds the total set size {total}")]
    OverlapTooLarge { total: usize, overlap: usize },
}

fn token(rng: &mut impl RngCore) -> String {
    format!("{:08x}", rng.next_u32())
}

/// Generate two sets of `total` elements each that share exactly `overlap`
/// elements.
///
/// Shared elements look like `common_{i}_{hex}`, the rest `A_{i}_{hex}` and
/// `B_{i}_{hex}`. The index keeps every element unique within its group.
pub fn generate_random_sets<R: RngCore>(
    total: usize,
    overlap: usize,
    rng: &mut R,
) -> Result<(BTreeSet<String>, BTreeSet<String>), SetGenError> {
    if overlap > total {
        return Err(SetGenError::OverlapTooLarge { total, overlap });
    }

    let common: BTreeSet<String> = (0..overlap)
        .map(|i| format!("common_{}_{}", i, token(rng)))
        .collect();

    let mut set_a = common.clone();
    set_a.extend((0..total - overlap).map(|i| format!("A_{}_{}", i, token(rng))));

    let mut set_b = common;
    set_b.extend((0..total - overlap).map(|i| format!("B_{}_{}", i, token(rng))));

    Ok((set_a, set_b))
}
