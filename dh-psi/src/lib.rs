//! # Diffie-Hellman Private Set Intersection
//!
//! This library implements two-party Private Set Intersection (PSI) with
//! Diffie-Hellman commutative masking over a multiplicative group modulo a
//! prime `p`, in the semi-honest model.
//!
//! Each party hashes its elements into the group and raises them to a secret
//! exponent. The masked values are exchanged and raised to the other party's
//! exponent. Since `(H(x)^a)^b = (H(x)^b)^a mod p`, an element held by both
//! parties ends up with the same doubly masked value on both sides, while
//! values of non-shared elements reveal nothing useful to the counterpart.
//!
//! ## Features
//!
//! - **Transport Agnostic**: Parties exchange messages through the
//!   [`Channel`] trait. [`MemoryChannel`] covers the in-process case; any
//!   other transport implements the same two methods.
//! - **Injected Randomness**: Secret exponents are drawn from a caller-supplied
//!   `RngCore + CryptoRng`, so tests can use a seeded generator.
//! - **Parallel Masking**: Independent masking passes run on `rayon`.
//!
//! ## Protocol Overview
//!
//! 1. **Init**: Build two [`Party`] values over the same [`GroupParameters`].
//! 2. **First round**: Each party calls [`Party::blind`] and sends the result.
//! 3. **Second round**: Each party calls [`Party::reblind`] on what it
//!    received; the result for the initiator's elements goes back to her.
//! 4. **Intersection**: [`Party::intersect`] matches the two doubly masked
//!    value sets and resolves the matches to plaintext.
//!
//! [`PsiSession`] runs all of this for two in-process parties.
//!
//! ## Example Usage
//!
//! ```
//! use dh_psi::{compute_intersection, GroupParameters};
//! use rand::rngs::OsRng;
//!
//! let a = ["a1", "a2", "a3", "common1", "common2"];
//! let b = ["b1", "common1", "common2", "b2"];
//!
//! let result = compute_intersection(&GroupParameters::reference(), a, b, &mut OsRng)?;
//! assert_eq!(result.iter().collect::<Vec<_>>(), vec!["common1", "common2"]);
//! # Ok::<(), dh_psi::PsiError>(())
//! ```
//!
//! ## Security Considerations
//!
//! - [`GroupParameters::reference`] uses a 127-bit modulus. It is meant for
//!   teaching and benchmarking only.
//! - Parties are assumed to follow the protocol. There is no protection
//!   against a party that deviates from it.
//! - Arithmetic is not constant time.
//!
//! ## Modules
//!
//! - [`messages`] - Message types for protocol exchange
//! - [`protocol`] - In-process orchestration of a full run
//! - [`party`] - One side of the protocol
//! - [`channel`] - Message exchange interface
//! - [`crypto`] - Hashing into the group and masking
//! - [`group`] - Group parameters
//! - [`error`] - Error types

pub use channel::{Channel, MemoryChannel};
pub use crypto::{blind_value, double_blind, hash_element, hash_to_group, SecretExponent};
pub use error::{PsiError, Result};
pub use group::GroupParameters;
pub use messages::{
    BlindedMessage, BlindedPair, DoubleBlindedMessage, DoubleBlindedPair, ElementRef,
    IntersectionResult, Message,
};
pub use party::Party;
pub use protocol::{compute_intersection, Phase, PsiSession};

pub mod channel;
pub mod crypto;
pub mod error;
pub mod group;
pub mod messages;
pub mod party;
pub mod protocol;
