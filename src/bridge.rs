//! Callback-to-future bridge with a single-resolution guarantee.
//!
//! Store handlers may fire more than once (a result followed by an error, or
//! an update after the initial result) or not at all. [`completion`] hands out
//! a cloneable [`Resolver`] for the handlers and a [`Completion`] for the
//! caller. The first resolution wins; later ones are rejected and logged. If
//! every resolver is dropped without resolving, the caller receives
//! [`QueryError::Abandoned`] instead of waiting forever.

use crate::error::QueryError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use tracing::warn;

type Outcome<T> = Result<T, QueryError>;

/// Create a linked resolver/completion pair.
pub fn completion<T>() -> (Resolver<T>, Completion<T>) {
    let (sender, receiver) = oneshot::channel();
    let resolver = Resolver {
        sender: Arc::new(Mutex::new(Some(sender))),
        rejected: Arc::new(AtomicUsize::new(0)),
    };
    (resolver, Completion { receiver })
}

/// Write side of a completion. Clones share the same slot.
pub struct Resolver<T> {
    sender: Arc<Mutex<Option<oneshot::Sender<Outcome<T>>>>>,
    rejected: Arc<AtomicUsize>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
            rejected: Arc::clone(&self.rejected),
        }
    }
}

impl<T> Resolver<T> {
    /// Resolve with `outcome`. Returns `false` if already resolved.
    pub fn resolve(&self, outcome: Outcome<T>) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            Some(sender) => {
                // The caller may have stopped waiting; the slot is spent either way.
                let _ = sender.send(outcome);
                true
            }
            None => {
                let rejected = self.rejected.fetch_add(1, Ordering::SeqCst) + 1;
                match &outcome {
                    Ok(_) => warn!(rejected, "ignoring late success for a completed query"),
                    Err(err) => {
                        warn!(rejected, error = %err, "ignoring late failure for a completed query")
                    }
                }
                false
            }
        }
    }

    pub fn succeed(&self, value: T) -> bool {
        self.resolve(Ok(value))
    }

    pub fn fail(&self, err: QueryError) -> bool {
        self.resolve(Err(err))
    }

    pub fn is_resolved(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Number of resolutions turned away after the first.
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }
}

/// Read side of a completion.
pub struct Completion<T> {
    receiver: oneshot::Receiver<Outcome<T>>,
}

impl<T> Completion<T> {
    /// Wait for the first resolution.
    pub async fn wait(self) -> Outcome<T> {
        self.receiver
            .await
            .unwrap_or(Err(QueryError::Abandoned))
    }
}
