//! Error types for the PSI protocol.
//!
//! Every error is terminal for the run that raised it. A caller that wants to
//! retry must start a fresh run, which draws fresh secret exponents.
//!
//! Hash collisions between distinct elements are not represented here: they
//! would show up as a false positive in the intersection and the protocol has
//! no way to notice them. Only a caller that checks the result against a
//! known-true intersection can observe one.

use thiserror::Error;

/// Errors that can occur during PSI protocol execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PsiError {
    /// The modulus or generator is outside the accepted range.
    #[error("Invalid group parameters: {0}")]
    InvalidGroupParameters(String),

    /// The randomness source could not supply a secret exponent.
    #[error("Secure randomness unavailable: {0}")]
    EntropyUnavailable(String),

    /// A round was attempted before the data it depends on was exchanged.
    #[error("Exchange incomplete: {0}")]
    ExchangeIncomplete(String),

    /// A channel implementation failed to deliver or decode a message.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for PSI operations.
pub type Result<T> = std::result::Result<T, PsiError>;
