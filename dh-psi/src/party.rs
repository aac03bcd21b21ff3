//! One side of the PSI protocol.

use crate::crypto::{blind_value, hash_to_group, SecretExponent};
use crate::error::{PsiError, Result};
use crate::group::GroupParameters;
use crate::messages::{
    BlindedMessage, BlindedPair, DoubleBlindedMessage, DoubleBlindedPair, ElementRef,
    IntersectionResult,
};
use log::{debug, warn};
use num_bigint::BigUint;
use rand::seq::SliceRandom;
use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// A protocol participant.
///
/// `Party` holds an identity label, the shared group parameters, its own
/// element set and a secret exponent drawn once at construction. The same
/// exponent is used for both [`blind`](Party::blind) and
/// [`reblind`](Party::reblind) for the lifetime of the value, so a fresh run
/// needs a fresh `Party`.
///
/// Only the party that blinded an element can map the resulting handle back
/// to the plaintext, through [`resolve`](Party::resolve).
#[derive(Debug, Clone)]
pub struct Party {
    name: String,
    params: GroupParameters,
    secret: SecretExponent,
    /// Owned elements, deduplicated then shuffled. Handles index into this
    /// list, so neither handles nor message order reveal an element's rank.
    elements: Vec<String>,
}

impl Party {
    /// Create a party owning `elements`, drawing its secret from `rng`.
    ///
    /// Duplicate elements are collapsed and the rest put in a random order
    /// drawn from `rng`.
    ///
    /// # Errors
    /// Returns `PsiError::EntropyUnavailable` if `rng` cannot supply the
    /// secret exponent.
    pub fn new<I, S, R>(
        name: impl Into<String>,
        params: &GroupParameters,
        elements: I,
        rng: &mut R,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        R: RngCore + CryptoRng,
    {
        let name = name.into();
        let secret = SecretExponent::generate(params, rng)?;
        let mut elements: Vec<String> = elements
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        elements.shuffle(rng);
        debug!("{}: initialised with {} elements", name, elements.len());

        Ok(Self {
            name,
            params: params.clone(),
            secret,
            elements,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &GroupParameters {
        &self.params
    }

    /// Returns the number of owned elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(String::as_str)
    }

    /// Map a handle issued by this party back to its element.
    pub fn resolve(&self, reference: ElementRef) -> Option<&str> {
        self.elements.get(reference.index()).map(String::as_str)
    }

    /// First round: hash every owned element into the group and mask it
    /// with this party's secret.
    pub fn blind(&self) -> BlindedMessage {
        let items: Vec<BlindedPair> = self
            .elements
            .par_iter()
            .enumerate()
            .map(|(index, element)| BlindedPair {
                reference: ElementRef::new(index),
                value: blind_value(
                    &hash_to_group(element, &self.params),
                    &self.secret,
                    &self.params,
                ),
            })
            .collect();
        debug!("{}: blinded {} elements", self.name, items.len());
        BlindedMessage::new(items)
    }

    /// Second round: mask the counterpart's first-round values with this
    /// party's secret, keeping the counterpart's handles.
    pub fn reblind(&self, received: &BlindedMessage) -> DoubleBlindedMessage {
        if received.is_empty() {
            warn!("{}: reblinding an empty message", self.name);
        }
        let items: Vec<DoubleBlindedPair> = received
            .items
            .par_iter()
            .map(|pair| DoubleBlindedPair {
                reference: pair.reference,
                value: blind_value(&pair.value, &self.secret, &self.params),
            })
            .collect();
        debug!("{}: reblinded {} values", self.name, items.len());
        DoubleBlindedMessage::new(items)
    }

    /// Intersect this party's double-masked elements with the counterpart's.
    ///
    /// `own` must be this party's first-round output after the counterpart
    /// reblinded it; `peer` is the counterpart's first-round output after
    /// this party reblinded it. Matching values are resolved through this
    /// party's handles.
    ///
    /// # Errors
    /// Returns `PsiError::Transport` if `own` carries a handle this party
    /// never issued.
    pub fn intersect(
        &self,
        own: &DoubleBlindedMessage,
        peer: &DoubleBlindedMessage,
    ) -> Result<IntersectionResult> {
        let by_value: HashMap<&BigUint, ElementRef> = own
            .items
            .iter()
            .map(|pair| (&pair.value, pair.reference))
            .collect();

        let mut elements = BTreeSet::new();
        for value in peer.value_set() {
            if let Some(reference) = by_value.get(value) {
                let element = self.resolve(*reference).ok_or_else(|| {
                    PsiError::Transport(format!(
                        "{}: unknown element reference {}",
                        self.name,
                        reference.index()
                    ))
                })?;
                elements.insert(element.to_string());
            }
        }

        debug!(
            "{}: {} of {} own values matched",
            self.name,
            elements.len(),
            own.len()
        );
        Ok(IntersectionResult::new(elements))
    }

    #[cfg(test)]
    pub(crate) fn secret(&self) -> &SecretExponent {
        &self.secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::double_blind;
    use crate::crypto::test_rng::FailingRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn party(name: &str, items: &[&str], seed: u64) -> Party {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        Party::new(name, &GroupParameters::reference(), items.iter().copied(), &mut rng).unwrap()
    }

    #[test]
    fn test_party_new() {
        let alice = party("Alice", &["b", "a", "b"], 1);
        assert_eq!(alice.name(), "Alice");
        assert_eq!(alice.len(), 2);
        let mut elements: Vec<_> = alice.elements().collect();
        elements.sort();
        assert_eq!(elements, vec!["a", "b"]);
        for (index, element) in alice.elements().enumerate() {
            assert_eq!(alice.resolve(ElementRef::new(index)), Some(element));
        }
        assert_eq!(alice.resolve(ElementRef::new(2)), None);
    }

    /// Position and handle of `element` in the party's first-round message.
    fn position_of(party: &Party, element: &str) -> (usize, usize) {
        let blinded = party.blind();
        let position = blinded
            .items
            .iter()
            .position(|pair| party.resolve(pair.reference) == Some(element))
            .unwrap();
        (position, blinded.items[position].reference.index())
    }

    #[test]
    fn test_message_order_does_not_follow_sort_rank() {
        // "common" sorts last among Bob's elements; across seeds it must
        // still show up at every position of his first-round message.
        let mut seen = BTreeSet::new();
        for seed in 0..64 {
            let bob = party("Bob", &["aaa", "abc", "common"], seed);
            let (position, reference) = position_of(&bob, "common");
            assert_eq!(position, reference);
            seen.insert(position);
        }
        assert_eq!(seen.into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_shared_element_position_hides_other_elements() {
        // Under one seed, the shared element lands wherever the permutation
        // sends it. Across seeds the distribution is the same whether the
        // other elements sort before or after it.
        let mut before = [0usize; 3];
        let mut after = [0usize; 3];
        for seed in 0..300 {
            let sorts_last = party("Bob", &["aaa", "abc", "common"], seed);
            let sorts_first = party("Bob", &["common", "zzz1", "zzz2"], seed);
            before[position_of(&sorts_last, "common").0] += 1;
            after[position_of(&sorts_first, "common").0] += 1;
        }
        for counts in [before, after] {
            for count in counts {
                assert!((60..=140).contains(&count), "skewed positions: {:?}", counts);
            }
        }
    }

    #[test]
    fn test_party_new_failing_entropy() {
        let result = Party::new("Alice", &GroupParameters::reference(), ["a"], &mut FailingRng);
        assert!(matches!(result, Err(PsiError::EntropyUnavailable(_))));
    }

    #[test]
    fn test_blind_is_stable() {
        let alice = party("Alice", &["apple", "banana"], 2);
        let first = alice.blind();
        let second = alice.blind();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_blind_hides_hash() {
        let alice = party("Alice", &["apple"], 3);
        let msg = alice.blind();
        let hashed = hash_to_group("apple", alice.params());
        assert_ne!(msg.items[0].value, hashed);
    }

    #[test]
    fn test_blind_empty_set() {
        let alice = party("Alice", &[], 4);
        assert!(alice.is_empty());
        assert!(alice.blind().is_empty());
    }

    #[test]
    fn test_reblind_preserves_references() {
        let alice = party("Alice", &["apple", "banana", "cherry"], 5);
        let bob = party("Bob", &["date"], 6);
        let blinded = alice.blind();
        let double = bob.reblind(&blinded);
        assert_eq!(double.len(), 3);
        for (single, twice) in blinded.items.iter().zip(&double.items) {
            assert_eq!(single.reference, twice.reference);
            assert_ne!(single.value, twice.value);
        }
    }

    #[test]
    fn test_reblind_matches_double_blind() {
        let alice = party("Alice", &["common"], 7);
        let bob = party("Bob", &["common"], 8);
        let via_alice = bob.reblind(&alice.blind());
        let via_bob = alice.reblind(&bob.blind());
        let expected = double_blind("common", alice.secret(), bob.secret(), alice.params());
        assert_eq!(via_alice.items[0].value, expected);
        assert_eq!(via_bob.items[0].value, expected);
    }

    #[test]
    fn test_intersect() {
        let alice = party("Alice", &["a1", "common1", "common2"], 9);
        let bob = party("Bob", &["b1", "common2", "common1"], 10);
        let alice_double = bob.reblind(&alice.blind());
        let bob_double = alice.reblind(&bob.blind());

        let from_alice = alice.intersect(&alice_double, &bob_double).unwrap();
        let from_bob = bob.intersect(&bob_double, &alice_double).unwrap();
        assert_eq!(from_alice.iter().collect::<Vec<_>>(), vec!["common1", "common2"]);
        assert_eq!(from_alice, from_bob);
    }

    #[test]
    fn test_intersect_unknown_reference() {
        let alice = party("Alice", &["common"], 11);
        let bob = party("Bob", &["x", "y", "common"], 12);
        // Bob's handles routed to Alice as if they were hers.
        let bob_double = alice.reblind(&bob.blind());
        let result = alice.intersect(&bob_double, &bob_double);
        assert!(matches!(result, Err(PsiError::Transport(_))));
    }
}
