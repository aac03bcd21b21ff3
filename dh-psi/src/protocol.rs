//! Core protocol logic for PSI.
//!
//! [`PsiSession`] drives one run between two in-process parties:
//!
//! ```text
//! Init -> FirstBlindExchanged -> SecondBlindExchanged -> IntersectionComputed -> Done
//! ```
//!
//! Each party's first-round output travels to the other through a
//! [`MemoryChannel`] and is reblinded there. Bob returns Alice's doubly
//! masked elements to her, so Alice ends up holding her own elements masked
//! by both secrets (with handles) next to Bob's elements masked by both
//! secrets (opaque). Alice, the initiator, resolves the matching values to
//! plaintext.

use crate::channel::{Channel, MemoryChannel};
use crate::error::{PsiError, Result};
use crate::group::GroupParameters;
use crate::messages::{DoubleBlindedMessage, IntersectionResult, Message};
use crate::party::Party;
use log::{debug, info};
use rand::{CryptoRng, RngCore};
use std::fmt;

/// Progress of a [`PsiSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    FirstBlindExchanged,
    SecondBlindExchanged,
    IntersectionComputed,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::FirstBlindExchanged => "first blind exchanged",
            Phase::SecondBlindExchanged => "second blind exchanged",
            Phase::IntersectionComputed => "intersection computed",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Double-masked values as seen by one party after the second round.
#[derive(Debug)]
struct SecondRoundView {
    /// This party's elements masked by both secrets, returned by the counterpart.
    own: DoubleBlindedMessage,
    /// The counterpart's elements masked by both secrets, computed locally.
    peer: DoubleBlindedMessage,
}

/// Orchestrates a single two-party run.
///
/// A session is single-use. Any error leaves it unusable: start over with a
/// new session, which draws new secret exponents.
pub struct PsiSession {
    phase: Phase,
    alice: Party,
    bob: Party,
    alice_link: MemoryChannel<Message>,
    bob_link: MemoryChannel<Message>,
    alice_view: Option<SecondRoundView>,
    result: Option<IntersectionResult>,
}

impl PsiSession {
    /// Create a session between two existing parties.
    ///
    /// `alice` is the initiator: the final intersection is resolved through
    /// her element handles.
    ///
    /// # Errors
    /// Returns `PsiError::InvalidGroupParameters` if the parties were built
    /// over different groups.
    pub fn new(alice: Party, bob: Party) -> Result<Self> {
        if alice.params() != bob.params() {
            return Err(PsiError::InvalidGroupParameters(format!(
                "{} and {} do not share group parameters",
                alice.name(),
                bob.name()
            )));
        }
        let (alice_link, bob_link) = MemoryChannel::pair();
        Ok(Self {
            phase: Phase::Init,
            alice,
            bob,
            alice_link,
            bob_link,
            alice_view: None,
            result: None,
        })
    }

    /// Build both parties over `params` and create a session between them.
    ///
    /// # Errors
    /// Returns `PsiError::EntropyUnavailable` if `rng` cannot supply either
    /// secret exponent. No masking happens in that case.
    pub fn from_sets<A, B, S, R>(
        params: &GroupParameters,
        set_a: A,
        set_b: B,
        rng: &mut R,
    ) -> Result<Self>
    where
        A: IntoIterator<Item = S>,
        B: IntoIterator<Item = S>,
        S: Into<String>,
        R: RngCore + CryptoRng,
    {
        let alice = Party::new("Alice", params, set_a, rng)?;
        let bob = Party::new("Bob", params, set_b, rng)?;
        Self::new(alice, bob)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn alice(&self) -> &Party {
        &self.alice
    }

    pub fn bob(&self) -> &Party {
        &self.bob
    }

    fn expect_phase(&self, expected: Phase, step: &str) -> Result<()> {
        if self.phase != expected {
            return Err(PsiError::ExchangeIncomplete(format!(
                "{} requires phase '{}', session is in phase '{}'",
                step, expected, self.phase
            )));
        }
        Ok(())
    }

    /// Both parties blind their own elements and send the result across.
    ///
    /// The two `blind` calls are independent and run in parallel.
    pub fn exchange_first_round(&mut self) -> Result<()> {
        self.expect_phase(Phase::Init, "first round")?;

        let (alice_blinded, bob_blinded) =
            rayon::join(|| self.alice.blind(), || self.bob.blind());

        self.alice_link.send(Message::Blinded(alice_blinded))?;
        self.bob_link.send(Message::Blinded(bob_blinded))?;

        self.phase = Phase::FirstBlindExchanged;
        debug!("first round exchanged");
        Ok(())
    }

    /// Each party reblinds the counterpart's first-round output; Bob returns
    /// his to Alice.
    ///
    /// # Errors
    /// Returns `PsiError::ExchangeIncomplete` if either first-round message
    /// is missing.
    pub fn exchange_second_round(&mut self) -> Result<()> {
        self.expect_phase(Phase::FirstBlindExchanged, "second round")?;

        // Barrier: both first-round messages must be present before any reblind.
        let from_bob = self.alice_link.receive()?.into_blinded()?;
        let from_alice = self.bob_link.receive()?.into_blinded()?;

        let (bob_double, alice_double) = rayon::join(
            || self.alice.reblind(&from_bob),
            || self.bob.reblind(&from_alice),
        );

        // Alice's elements go back to Alice; Bob's stay with her as opaque values.
        self.bob_link.send(Message::DoubleBlinded(alice_double))?;
        let own = self.alice_link.receive()?.into_double_blinded()?;

        self.alice_view = Some(SecondRoundView {
            own,
            peer: bob_double,
        });
        self.phase = Phase::SecondBlindExchanged;
        debug!("second round exchanged");
        Ok(())
    }

    /// Intersect the two double-masked value sets and resolve the matches
    /// to plaintext through the initiator's handles.
    pub fn compute_intersection(&mut self) -> Result<&IntersectionResult> {
        self.expect_phase(Phase::SecondBlindExchanged, "intersection")?;
        let view = self.alice_view.as_ref().ok_or_else(|| {
            PsiError::ExchangeIncomplete("second-round values are missing".to_string())
        })?;

        let result = self.alice.intersect(&view.own, &view.peer)?;
        info!(
            "intersection computed: {} elements ({} x {})",
            result.len(),
            self.alice.len(),
            self.bob.len()
        );

        self.phase = Phase::IntersectionComputed;
        let result: &IntersectionResult = self.result.insert(result);
        Ok(result)
    }

    /// Consume the session and return the intersection.
    pub fn finish(mut self) -> Result<IntersectionResult> {
        self.expect_phase(Phase::IntersectionComputed, "finish")?;
        self.phase = Phase::Done;
        self.result.take().ok_or_else(|| {
            PsiError::ExchangeIncomplete("intersection was not computed".to_string())
        })
    }

    /// Run every remaining step.
    pub fn run(mut self) -> Result<IntersectionResult> {
        self.exchange_first_round()?;
        self.exchange_second_round()?;
        self.compute_intersection()?;
        self.finish()
    }
}

impl fmt::Debug for PsiSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PsiSession")
            .field("phase", &self.phase)
            .field("alice", &self.alice.name())
            .field("bob", &self.bob.name())
            .finish()
    }
}

/// Run a full session over `params` and return `set_a ∩ set_b`.
///
/// # Errors
/// Propagates any construction or sequencing error; no partial result is
/// returned.
pub fn compute_intersection<A, B, S, R>(
    params: &GroupParameters,
    set_a: A,
    set_b: B,
    rng: &mut R,
) -> Result<IntersectionResult>
where
    A: IntoIterator<Item = S>,
    B: IntoIterator<Item = S>,
    S: Into<String>,
    R: RngCore + CryptoRng,
{
    PsiSession::from_sets(params, set_a, set_b, rng)?.run()
}
