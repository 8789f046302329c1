//! Bounded handoff channel between a generator and its consumer.
//!
//! The producer half is [`Yield`], handed to the generator function; the
//! consumer half is [`HandoffReceiver`], owned by the cursor. Both share a
//! small state block carrying the "producer finished" flag, kept separate
//! from emptiness, and a cancellation signal that any [`CancelHandle`] can
//! fire.
//!
//! Cancellation is broadcast by dropping the only sender of a zero-sized
//! signal channel: every receiver of that channel becomes ready at once,
//! which wakes a producer blocked on a full buffer as well as a consumer
//! blocked waiting for a value.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{select, Receiver, Sender};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::Cancelled;

/// Observable state of a handoff channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// The producer may still push values.
    Open,
    /// The producer will push nothing more; buffered values remain readable.
    ProducerDone,
    /// The consumer abandoned the run; buffered values may be discarded.
    Cancelled,
}

struct Shared {
    producer_done: AtomicBool,
    cancelled: AtomicBool,
    cancel_tx: Mutex<Option<Sender<()>>>,
}

impl Shared {
    fn cancel(&self) -> bool {
        let first = !self.cancelled.swap(true, Ordering::AcqRel);
        // Disconnects every clone of the signal receiver.
        drop(self.cancel_tx.lock().take());
        first
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn is_producer_done(&self) -> bool {
        self.producer_done.load(Ordering::Acquire)
    }

    fn state(&self) -> ChannelState {
        if self.is_cancelled() {
            ChannelState::Cancelled
        } else if self.is_producer_done() {
            ChannelState::ProducerDone
        } else {
            ChannelState::Open
        }
    }
}

/// Create a handoff channel holding at most `depth` values.
///
/// # Panics
///
/// Panics if `depth` is zero. The builder rejects a zero depth before
/// calling this.
#[must_use]
pub fn bounded<U>(depth: usize) -> (Yield<U>, HandoffReceiver<U>) {
    assert!(depth >= 1, "handoff channel depth must be at least 1");
    let (tx, rx) = crossbeam_channel::bounded(depth);
    let (cancel_tx, cancel_rx) = crossbeam_channel::bounded(0);
    let shared = Arc::new(Shared {
        producer_done: AtomicBool::new(false),
        cancelled: AtomicBool::new(false),
        cancel_tx: Mutex::new(Some(cancel_tx)),
    });
    let producer = Yield {
        tx,
        cancel_rx: cancel_rx.clone(),
        shared: Arc::clone(&shared),
        sent: AtomicU64::new(0),
    };
    let consumer = HandoffReceiver {
        rx,
        cancel_rx,
        shared,
        depth,
    };
    (producer, consumer)
}

/// The yield callback handed to a generator function.
///
/// # Example
/// ```
/// use fibgen_core::channel::bounded;
///
/// let (tx, rx) = bounded::<u32>(4);
/// tx.send(1).unwrap();
/// tx.send(2).unwrap();
/// tx.mark_producer_done();
///
/// let mut batch = std::collections::VecDeque::new();
/// assert_eq!(rx.drain_batch(10, &mut batch), 2);
/// assert_eq!(batch, [1, 2]);
/// assert!(rx.is_producer_done());
/// ```
pub struct Yield<U> {
    tx: Sender<U>,
    cancel_rx: Receiver<()>,
    shared: Arc<Shared>,
    sent: AtomicU64,
}

impl<U> Yield<U> {
    /// Hand one value to the consumer, blocking while the buffer is full.
    ///
    /// Returns `Err(Cancelled)` and drops `value` if the consumer cancelled
    /// the run, whether before the call or while it was blocked.
    pub fn send(&self, value: U) -> Result<(), Cancelled> {
        if self.shared.is_cancelled() {
            return Err(Cancelled);
        }
        select! {
            send(self.tx, value) -> res => res.map_err(|_| Cancelled)?,
            recv(self.cancel_rx) -> _ => return Err(Cancelled),
        }
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Number of values accepted by [`send`](Self::send) so far.
    #[must_use]
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Whether the consumer has cancelled the run.
    ///
    /// Generators doing long stretches of work between yields can poll
    /// this as a cooperative checkpoint.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }

    /// Signal that no more values will be pushed. Idempotent.
    ///
    /// Returns `true` on the call that performed the transition.
    pub fn mark_producer_done(&self) -> bool {
        !self.shared.producer_done.swap(true, Ordering::AcqRel)
    }
}

impl<U> Drop for Yield<U> {
    // A producer half that goes away can push nothing more, even when the
    // producer thread unwinds past its normal exit path.
    fn drop(&mut self) {
        self.mark_producer_done();
    }
}

/// Consumer half of the handoff channel.
pub struct HandoffReceiver<U> {
    rx: Receiver<U>,
    cancel_rx: Receiver<()>,
    shared: Arc<Shared>,
    depth: usize,
}

impl<U> HandoffReceiver<U> {
    /// Move up to `max_items` buffered values, oldest first, onto the back
    /// of `out` without blocking. Returns how many were moved.
    pub fn drain_batch(&self, max_items: usize, out: &mut VecDeque<U>) -> usize {
        let before = out.len();
        out.extend(self.rx.try_iter().take(max_items));
        out.len() - before
    }

    /// Wait up to `timeout` for a single value.
    ///
    /// Returns `None` on timeout, on cancellation, or once the producer has
    /// gone away with nothing left in the buffer.
    pub fn poll_one(&self, timeout: Duration) -> Option<U> {
        select! {
            recv(self.rx) -> msg => msg.ok(),
            recv(self.cancel_rx) -> _ => None,
            default(timeout) => None,
        }
    }

    /// Whether the producer has signalled it is finished.
    #[must_use]
    pub fn is_producer_done(&self) -> bool {
        self.shared.is_producer_done()
    }

    /// Whether the run has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }

    /// Current state of the channel.
    #[must_use]
    pub fn state(&self) -> ChannelState {
        self.shared.state()
    }

    /// Tear the channel down, waking a producer blocked in `send`.
    ///
    /// Returns `true` on the call that performed the cancellation.
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    /// Number of values currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether the buffer is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Maximum number of values the buffer holds.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// A handle that can cancel this channel from any thread.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Cloneable handle that cancels a running generator from any thread.
///
/// Cancelling through a handle unblocks the producer immediately; the
/// owning cursor notices on its next (or current) `advance` and runs its
/// completion protocol there.
///
/// # Example
/// ```
/// use fibgen_core::channel::{bounded, ChannelState};
///
/// let (tx, rx) = bounded::<u8>(1);
/// let handle = rx.cancel_handle();
/// handle.cancel();
/// assert_eq!(rx.state(), ChannelState::Cancelled);
/// assert!(tx.send(1).is_err());
/// ```
#[derive(Clone)]
pub struct CancelHandle {
    shared: Arc<Shared>,
}

impl CancelHandle {
    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        if self.shared.cancel() {
            debug!("generator cancellation requested");
        }
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("state", &self.shared.state())
            .finish()
    }
}
