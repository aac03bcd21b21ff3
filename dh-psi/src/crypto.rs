//! Cryptographic operations for the PSI protocol.

use crate::error::{PsiError, Result};
use crate::group::GroupParameters;
use num_bigint::BigUint;
use num_traits::One;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use std::fmt;

/// Rejection sampling gives up after this many draws. Each draw is accepted
/// with probability at least one half, so only a broken source gets here.
const MAX_SAMPLING_ATTEMPTS: usize = 128;

/// A party's private exponent, drawn uniformly from `[1, modulus - 2]`.
///
/// The value never leaves the crate and is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretExponent(BigUint);

impl SecretExponent {
    /// Draw a fresh exponent for the given group.
    ///
    /// # Errors
    /// Returns `PsiError::EntropyUnavailable` if `rng` fails to produce bytes.
    pub fn generate<R: RngCore + CryptoRng>(
        params: &GroupParameters,
        rng: &mut R,
    ) -> Result<Self> {
        random_exponent(params, rng).map(Self)
    }

    #[cfg(test)]
    pub(crate) fn from_biguint(value: BigUint) -> Self {
        Self(value)
    }

    pub(crate) fn as_biguint(&self) -> &BigUint {
        &self.0
    }
}

impl fmt::Debug for SecretExponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretExponent(<redacted>)")
    }
}

/// Hash an element identifier to a 32-byte SHA-256 digest.
pub fn hash_element(element: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(element.as_bytes());
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Map an element into `[0, modulus)`.
///
/// The digest is read as a big-endian integer and reduced modulo the group
/// modulus. For moduli much smaller than 2^256 the reduction is slightly
/// biased towards small residues; full-domain hashing is not attempted.
pub fn hash_to_group(element: &str, params: &GroupParameters) -> BigUint {
    BigUint::from_bytes_be(&hash_element(element)) % params.modulus()
}

/// Raise `value` to `secret` modulo the group modulus.
pub fn blind_value(value: &BigUint, secret: &SecretExponent, params: &GroupParameters) -> BigUint {
    value.modpow(secret.as_biguint(), params.modulus())
}

/// Hash `element` and mask it with `first`, then with `second`.
///
/// The result equals `H(element)^(first * second) mod p`, so swapping the two
/// exponents yields the same value.
pub fn double_blind(
    element: &str,
    first: &SecretExponent,
    second: &SecretExponent,
    params: &GroupParameters,
) -> BigUint {
    let once = blind_value(&hash_to_group(element, params), first, params);
    blind_value(&once, second, params)
}

/// Draw an integer uniformly from `[1, modulus - 2]` by rejection sampling.
fn random_exponent<R: RngCore + CryptoRng>(
    params: &GroupParameters,
    rng: &mut R,
) -> Result<BigUint> {
    // Sample k in [0, n) with n = modulus - 2, then shift by one.
    let n = params.max_exponent();
    let bits = n.bits();
    let len = ((bits + 7) / 8) as usize;
    let top_mask = 0xffu8 >> (len as u64 * 8 - bits);
    let mut buf = vec![0u8; len];

    for _ in 0..MAX_SAMPLING_ATTEMPTS {
        rng.try_fill_bytes(&mut buf)
            .map_err(|e| PsiError::EntropyUnavailable(e.to_string()))?;
        buf[0] &= top_mask;
        let candidate = BigUint::from_bytes_be(&buf);
        if candidate < n {
            return Ok(candidate + BigUint::one());
        }
    }

    Err(PsiError::EntropyUnavailable(format!(
        "no exponent below the bound after {} draws",
        MAX_SAMPLING_ATTEMPTS
    )))
}


#[cfg(test)]
mod tests {
    use super::test_rng::{FailingRng, SaturatedRng};
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn small_group() -> GroupParameters {
        GroupParameters::new(BigUint::from(23u8), BigUint::from(5u8)).unwrap()
    }

    #[test]
    fn test_hash_element() {
        let hash1 = hash_element("test input");
        let hash2 = hash_element("test input");
        assert_eq!(hash1, hash2, "Hashing same input should produce same output");

        let hash3 = hash_element("different input");
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_hash_element_known_digest() {
        // SHA-256("abc")
        assert_eq!(hash_element("abc")[..4], [0xba, 0x78, 0x16, 0xbf]);
    }

    #[test]
    fn test_hash_to_group_in_range() {
        let params = GroupParameters::reference();
        for element in ["a1", "a2", "common1", ""] {
            let value = hash_to_group(element, &params);
            assert!(&value < params.modulus());
            assert_eq!(value, hash_to_group(element, &params));
        }
    }

    #[test]
    fn test_hash_to_group_reduces_digest() {
        let params = small_group();
        let expected = BigUint::from_bytes_be(&hash_element("x")) % BigUint::from(23u8);
        assert_eq!(hash_to_group("x", &params), expected);
    }

    #[test]
    fn test_blind_value_small_group() {
        let params = small_group();
        let secret = SecretExponent::from_biguint(BigUint::from(3u8));
        // 5^3 = 125 = 5 * 23 + 10
        assert_eq!(
            blind_value(&BigUint::from(5u8), &secret, &params),
            BigUint::from(10u8)
        );
    }

    #[test]
    fn test_double_blind_commutes() {
        let params = GroupParameters::reference();
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for element in ["a1", "common1", "b2"] {
            let s1 = SecretExponent::generate(&params, &mut rng).unwrap();
            let s2 = SecretExponent::generate(&params, &mut rng).unwrap();
            assert_eq!(
                double_blind(element, &s1, &s2, &params),
                double_blind(element, &s2, &s1, &params)
            );
        }
    }

    #[test]
    fn test_double_blind_matches_product_exponent() {
        let params = small_group();
        let s1 = SecretExponent::from_biguint(BigUint::from(4u8));
        let s2 = SecretExponent::from_biguint(BigUint::from(9u8));
        let product = SecretExponent::from_biguint(BigUint::from(36u8));
        let h = hash_to_group("element", &params);
        assert_eq!(
            double_blind("element", &s1, &s2, &params),
            blind_value(&h, &product, &params)
        );
    }

    #[test]
    fn test_random_exponent_in_range() {
        let params = small_group();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for _ in 0..500 {
            let secret = SecretExponent::generate(&params, &mut rng).unwrap();
            assert!(secret.as_biguint() >= &BigUint::one());
            assert!(secret.as_biguint() <= &BigUint::from(21u8));
        }
    }

    #[test]
    fn test_random_exponent_smallest_group() {
        // p = 3 leaves a single valid exponent.
        let params = GroupParameters::new(BigUint::from(3u8), BigUint::from(2u8)).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let secret = SecretExponent::generate(&params, &mut rng).unwrap();
        assert_eq!(secret.as_biguint(), &BigUint::one());
    }

    #[test]
    fn test_random_exponent_seeded_is_deterministic() {
        let params = GroupParameters::reference();
        let a = SecretExponent::generate(&params, &mut ChaCha20Rng::seed_from_u64(9)).unwrap();
        let b = SecretExponent::generate(&params, &mut ChaCha20Rng::seed_from_u64(9)).unwrap();
        let c = SecretExponent::generate(&params, &mut ChaCha20Rng::seed_from_u64(10)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_random_exponent_failing_source() {
        let params = GroupParameters::reference();
        let result = SecretExponent::generate(&params, &mut FailingRng);
        assert!(matches!(result, Err(PsiError::EntropyUnavailable(_))));
    }

    #[test]
    fn test_random_exponent_saturated_source() {
        let params = GroupParameters::reference();
        let result = SecretExponent::generate(&params, &mut SaturatedRng);
        assert!(matches!(result, Err(PsiError::EntropyUnavailable(_))));
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = SecretExponent::from_biguint(BigUint::from(12345u32));
        assert!(!format!("{:?}", secret).contains("12345"));
    }
}
