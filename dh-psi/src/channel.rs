//! Message exchange between the two parties.
//!
//! The protocol itself never touches sockets. Each party talks to its
//! counterpart through a [`Channel`], and the only contract is that the
//! counterpart's complete list has been delivered before it is consumed.
//! Framing, retries and timeouts belong to the channel implementation.

use crate::error::{PsiError, Result};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// One endpoint of a bidirectional link carrying messages of type `M`.
pub trait Channel<M> {
    /// Hand a complete message to the counterpart.
    fn send(&mut self, message: M) -> Result<()>;

    /// Take the next complete message from the counterpart.
    ///
    /// # Errors
    /// Returns `PsiError::ExchangeIncomplete` if the counterpart has not
    /// delivered a message yet.
    fn receive(&mut self) -> Result<M>;
}

/// In-process endpoint backed by a pair of `mpsc` queues.
///
/// `receive` never blocks: asking for a message that was not sent is a
/// sequencing error, not something to wait for.
#[derive(Debug)]
pub struct MemoryChannel<M> {
    tx: Sender<M>,
    rx: Receiver<M>,
}

impl<M> MemoryChannel<M> {
    /// Create two connected endpoints.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel();
        let (b_tx, a_rx) = mpsc::channel();
        (
            Self { tx: a_tx, rx: a_rx },
            Self { tx: b_tx, rx: b_rx },
        )
    }
}

impl<M> Channel<M> for MemoryChannel<M> {
    fn send(&mut self, message: M) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| PsiError::Transport("counterpart endpoint was dropped".to_string()))
    }

    fn receive(&mut self) -> Result<M> {
        match self.rx.try_recv() {
            Ok(message) => Ok(message),
            Err(TryRecvError::Empty) => Err(PsiError::ExchangeIncomplete(
                "counterpart has not sent its message".to_string(),
            )),
            Err(TryRecvError::Disconnected) => Err(PsiError::ExchangeIncomplete(
                "counterpart closed the channel without sending".to_string(),
            )),
        }
    }
}
