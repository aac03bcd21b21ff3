//! Shared group parameters.

use crate::error::{PsiError, Result};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::fmt;

/// Prime modulus and generator defining the group all masking happens in.
///
/// Both parties of a run hold the same instance. The parameters are never
/// mutated after construction. Only a basic range check is performed: the
/// caller is responsible for supplying a prime of adequate strength.
#[derive(Clone, PartialEq, Eq)]
pub struct GroupParameters {
    modulus: BigUint,
    generator: BigUint,
}

impl GroupParameters {
    /// Create group parameters after checking `modulus > 2` and
    /// `1 <= generator < modulus`.
    ///
    /// # Errors
    /// Returns `PsiError::InvalidGroupParameters` if either check fails.
    pub fn new(modulus: BigUint, generator: BigUint) -> Result<Self> {
        if modulus <= BigUint::from(2u8) {
            return Err(PsiError::InvalidGroupParameters(format!(
                "modulus must be greater than 2, got {}",
                modulus
            )));
        }
        if generator.is_zero() || generator >= modulus {
            return Err(PsiError::InvalidGroupParameters(format!(
                "generator must lie in [1, modulus), got {}",
                generator
            )));
        }
        Ok(Self { modulus, generator })
    }

    /// Parse both values from strings in the given radix.
    ///
    /// # Errors
    /// Returns `PsiError::InvalidGroupParameters` if a string is not a valid
    /// number or if the parsed values fail the checks of [`GroupParameters::new`].
    pub fn from_str_radix(modulus: &str, generator: &str, radix: u32) -> Result<Self> {
        let parse = |name: &str, value: &str| {
            BigUint::parse_bytes(value.as_bytes(), radix).ok_or_else(|| {
                PsiError::InvalidGroupParameters(format!(
                    "{} is not a base-{} number: {:?}",
                    name, radix, value
                ))
            })
        };
        Self::new(parse("modulus", modulus)?, parse("generator", generator)?)
    }

    /// The reference configuration: `p = 2^127 - 1`, `g = 5`.
    ///
    /// These parameters are only adequate for teaching and benchmarking. A
    /// 127-bit modulus offers no real security against a motivated attacker.
    pub fn reference() -> Self {
        let modulus = (BigUint::one() << 127u32) - BigUint::one();
        Self {
            modulus,
            generator: BigUint::from(5u8),
        }
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn generator(&self) -> &BigUint {
        &self.generator
    }

    /// Upper bound of the secret exponent range, `modulus - 2`.
    pub(crate) fn max_exponent(&self) -> BigUint {
        &self.modulus - BigUint::from(2u8)
    }
}

impl fmt::Debug for GroupParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupParameters")
            .field("modulus_bits", &self.modulus.bits())
            .field("generator", &self.generator)
            .finish()
    }
}
