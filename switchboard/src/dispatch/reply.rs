//! Single-delivery reply cell.
//!
//! Every inbound message must produce exactly one reply envelope, sent
//! exactly once, even when an underlying asynchronous completion fires more
//! than once (a stream erroring after it already emitted, a racing timeout).
//! [`ReplySlot`] is the mechanism: the first completion is honored, all
//! subsequent completions are discarded, not delivered.

use crate::event::Envelope;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;

/// Idempotent single-delivery cell for one reply envelope.
///
/// Wraps a consumable oneshot sender plus a completion flag. Safe to share
/// across the tasks that might race to complete a dispatch.
///
/// # Lifecycle
///
/// 1. **Created**: paired with a receiver via [`ReplySlot::channel`]
/// 2. **Pending**: handed to the dispatcher alongside the raw message
/// 3. **Completed**: by exactly one call to [`ReplySlot::complete`]
/// 4. Subsequent completions: discarded with a debug log
pub struct ReplySlot {
    sender: Mutex<Option<oneshot::Sender<Envelope>>>,
    completed: AtomicBool,
}

impl ReplySlot {
    /// Create a slot paired with the receiver that observes the reply.
    pub fn channel() -> (Self, oneshot::Receiver<Envelope>) {
        let (tx, rx) = oneshot::channel();
        (Self::new(tx), rx)
    }

    /// Wrap an existing oneshot sender.
    pub fn new(sender: oneshot::Sender<Envelope>) -> Self {
        Self {
            sender: Mutex::new(Some(sender)),
            completed: AtomicBool::new(false),
        }
    }

    /// A slot with no observer. Completions are accepted and dropped;
    /// used for fire-and-forget delivery.
    pub fn sink() -> Self {
        let (slot, rx) = Self::channel();
        drop(rx);
        slot
    }

    /// Whether a completion has already been accepted.
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Deliver the reply. Idempotent: only the first call is honored.
    pub fn complete(&self, envelope: Envelope) {
        if self.completed.swap(true, Ordering::AcqRel) {
            tracing::debug!(
                "ReplySlot::complete: discarding duplicate completion for action [{}]",
                envelope.action()
            );
            return;
        }

        let sender = self.sender.lock().map(|mut s| s.take()).unwrap_or(None);
        match sender {
            Some(tx) => {
                if tx.send(envelope).is_err() {
                    // Receiver gave up (bounded wait elapsed on the caller
                    // side). The reply is dropped, never re-sent.
                    tracing::debug!("ReplySlot::complete: receiver dropped, reply discarded");
                }
            }
            None => {
                tracing::warn!("ReplySlot::complete: sender already consumed");
            }
        }
    }
}
