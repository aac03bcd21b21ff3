//! Message types exchanged between PSI protocol peers.

use crate::error::{PsiError, Result};
use num_bigint::BigUint;
use std::collections::{BTreeSet, HashSet};

/// Opaque handle to one of the originating party's elements.
///
/// The receiving party only ever sees the handle, never the element. It is
/// meaningful solely to the party that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementRef(usize);

impl ElementRef {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// An element handle with its value masked once, `H(x)^s mod p`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlindedPair {
    pub reference: ElementRef,
    pub value: BigUint,
}

/// An element handle with its value masked by both parties' secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubleBlindedPair {
    pub reference: ElementRef,
    pub value: BigUint,
}

/// First-round message: one party's elements, each masked by its own secret.
///
/// This is what crosses the wire after [`Party::blind`](crate::Party::blind).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlindedMessage {
    /// Pairs of (reference, masked value) for each item
    pub items: Vec<BlindedPair>,
}

impl BlindedMessage {
    pub fn new(items: Vec<BlindedPair>) -> Self {
        Self { items }
    }

    /// Returns the number of items in this message.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if this message contains no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get just the masked values (without references).
    pub fn values(&self) -> Vec<BigUint> {
        self.items.iter().map(|pair| pair.value.clone()).collect()
    }
}

/// Second-round message: the values of a [`BlindedMessage`] re-masked by the
/// receiving party's secret, references preserved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DoubleBlindedMessage {
    pub items: Vec<DoubleBlindedPair>,
}

impl DoubleBlindedMessage {
    pub fn new(items: Vec<DoubleBlindedPair>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The set of double-masked values, references dropped.
    pub fn value_set(&self) -> HashSet<&BigUint> {
        self.items.iter().map(|pair| &pair.value).collect()
    }
}

/// Anything one party sends to the other over a [`Channel`](crate::Channel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// The sender's own elements, masked once.
    Blinded(BlindedMessage),
    /// The receiver's elements, masked by both secrets, returned to their
    /// originator.
    DoubleBlinded(DoubleBlindedMessage),
}

impl Message {
    /// Unwrap a first-round message.
    ///
    /// # Errors
    /// Returns `PsiError::ExchangeIncomplete` for a second-round message.
    pub fn into_blinded(self) -> Result<BlindedMessage> {
        match self {
            Message::Blinded(message) => Ok(message),
            Message::DoubleBlinded(_) => Err(PsiError::ExchangeIncomplete(
                "expected a first-round message, got a second-round one".to_string(),
            )),
        }
    }

    /// Unwrap a second-round message.
    ///
    /// # Errors
    /// Returns `PsiError::ExchangeIncomplete` for a first-round message.
    pub fn into_double_blinded(self) -> Result<DoubleBlindedMessage> {
        match self {
            Message::DoubleBlinded(message) => Ok(message),
            Message::Blinded(_) => Err(PsiError::ExchangeIncomplete(
                "expected a second-round message, got a first-round one".to_string(),
            )),
        }
    }
}

/// Final result of the PSI protocol: the plaintext intersection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntersectionResult {
    /// Elements present in both parties' sets
    pub elements: BTreeSet<String>,
}

impl IntersectionResult {
    pub fn new(elements: BTreeSet<String>) -> Self {
        Self { elements }
    }

    /// Returns the number of elements in the intersection.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the intersection is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, element: &str) -> bool {
        self.elements.contains(element)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(String::as_str)
    }

    pub fn into_set(self) -> BTreeSet<String> {
        self.elements
    }
}
