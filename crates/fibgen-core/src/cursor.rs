//! Pull-side cursor over a running generator.
//!
//! A [`GeneratorCursor`] drains the handoff channel in batches into a
//! local buffer and hands values out one `advance` at a time. When the
//! producer is finished and nothing is left, or when the run is
//! cancelled, the cursor runs its completion protocol exactly once:
//!
//! 1. join the producer thread;
//! 2. pass a captured generator error, if any, to the exception handler
//!    (skipped when the cursor is dropped while its thread is panicking);
//! 3. call the completion callback, even if step 2 panicked.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::channel::{CancelHandle, HandoffReceiver};
use crate::producer::ProducerTask;
use crate::sequence::Sequence;

/// Callback run once when a cursor is exhausted or cancelled.
pub type CompletionFn = Box<dyn FnOnce() + Send + 'static>;

/// Callback receiving the error a generator failed with.
pub type ExceptionFn = Box<dyn FnOnce(anyhow::Error) + Send + 'static>;

/// Lifecycle of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Nothing has been read yet.
    Idle,
    /// The local batch still holds unread values.
    HasBuffered,
    /// The local batch is empty; the next advance goes to the channel.
    Depleted,
    /// The producer finished and every value was consumed.
    Exhausted,
    /// The run was cancelled.
    Cancelled,
}

impl CursorState {
    /// Whether the cursor has reached a terminal state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Exhausted | Self::Cancelled)
    }
}

/// Everything the completion protocol consumes. Taken out of the cursor
/// exactly once.
struct Finalizer {
    producer: ProducerTask,
    on_completion: CompletionFn,
    on_exception: ExceptionFn,
}

impl Finalizer {
    fn run(self) {
        let Self {
            producer,
            on_completion,
            on_exception,
        } = self;
        let id = producer.id();
        ::unwind_safe::with_state(on_completion)
            .try_eval(move |_| {
                let outcome = producer.join();
                debug!(producer = id, ?outcome, "producer joined");
                if let Some(err) = outcome.into_error() {
                    if std::thread::panicking() {
                        // A second panic from the handler would abort the process.
                        warn!(
                            producer = id,
                            error = %err,
                            "consumer unwinding, exception handler skipped"
                        );
                    } else {
                        on_exception(err);
                    }
                }
            })
            .finally(move |on_completion| {
                debug!(producer = id, "running completion callback");
                on_completion();
            });
    }
}

/// Consumer-facing cursor over values produced on a background thread.
///
/// Built by [`RunnerBuilder`](crate::builder::RunnerBuilder). Dropping a
/// cursor that has not finished cancels it, so the producer thread never
/// outlives its consumer and the completion callback still fires.
///
/// # Example
/// ```
/// use fibgen_core::Runner;
///
/// let mut cursor = Runner::run(|y| {
///     for v in ["a", "b", "c"] {
///         y.send(v)?;
///     }
///     Ok(())
/// })
/// .on_completion(|| {})
/// .on_exception(|err| panic!("unexpected: {err}"))
/// .build()
/// .unwrap();
///
/// let mut seen = Vec::new();
/// while cursor.advance() {
///     seen.push(*cursor.current().unwrap());
/// }
/// assert_eq!(seen, ["a", "b", "c"]);
/// ```
pub struct GeneratorCursor<U> {
    rx: HandoffReceiver<U>,
    batch: VecDeque<U>,
    current: Option<U>,
    batch_size: usize,
    poll_interval: Duration,
    state: CursorState,
    finalizer: Option<Finalizer>,
}

impl<U> GeneratorCursor<U> {
    pub(crate) fn new(
        rx: HandoffReceiver<U>,
        producer: ProducerTask,
        on_completion: CompletionFn,
        on_exception: ExceptionFn,
        poll_interval: Duration,
    ) -> Self {
        let batch_size = rx.depth();
        Self {
            rx,
            batch: VecDeque::with_capacity(batch_size + 1),
            current: None,
            batch_size,
            poll_interval,
            state: CursorState::Idle,
            finalizer: Some(Finalizer {
                producer,
                on_completion,
                on_exception,
            }),
        }
    }

    /// Move to the next value. Returns `false` once no more values will
    /// come, after running the completion protocol.
    ///
    /// Blocks while the producer is still running and nothing is buffered.
    pub fn advance(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        if self.rx.is_cancelled() {
            self.finish(CursorState::Cancelled);
            return false;
        }
        if self.batch.is_empty() && !self.refill() {
            return false;
        }
        self.current = self.batch.pop_front();
        self.state = if self.batch.is_empty() {
            CursorState::Depleted
        } else {
            CursorState::HasBuffered
        };
        true
    }

    /// The value the last successful [`advance`](Self::advance) moved to.
    ///
    /// `None` before the first advance and after the end.
    #[must_use]
    pub fn current(&self) -> Option<&U> {
        self.current.as_ref()
    }

    pub(crate) fn take_current(&mut self) -> Option<U> {
        self.current.take()
    }

    /// Stop the run: unblock and abandon the producer, then run the
    /// completion protocol. No-op once the protocol has fired.
    pub fn cancel(&mut self) {
        if self.finalizer.is_some() {
            self.finish(CursorState::Cancelled);
        }
    }

    /// A handle that cancels this cursor from elsewhere, e.g. from a filter
    /// closure while a [`Sequence`] is being iterated.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.rx.cancel_handle()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Whether the completion protocol has already run.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalizer.is_none()
    }

    /// Values waiting in the handoff channel, not counting the local batch.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.rx.len()
    }

    /// Capacity of the handoff channel.
    #[must_use]
    pub fn buffer_depth(&self) -> usize {
        self.rx.depth()
    }

    /// Wrap this cursor as a single-pass iterator.
    #[must_use]
    pub fn into_sequence(self) -> Sequence<U> {
        Sequence::new(self)
    }

    /// Fill the local batch from the channel, waiting for the producer as
    /// needed. Returns `false` after finishing the cursor.
    fn refill(&mut self) -> bool {
        loop {
            if self.rx.is_cancelled() {
                self.finish(CursorState::Cancelled);
                return false;
            }
            // Read the flag before draining: every push that preceded it is
            // then visible to the drain.
            let producer_done = self.rx.is_producer_done();
            let drained = self.rx.drain_batch(self.batch_size, &mut self.batch);
            if drained > 0 {
                trace!(drained, "drained batch");
                return true;
            }
            if producer_done {
                self.finish(CursorState::Exhausted);
                return false;
            }
            if let Some(value) = self.rx.poll_one(self.poll_interval) {
                self.batch.push_back(value);
                let drained = self.rx.drain_batch(self.batch_size - 1, &mut self.batch);
                trace!(drained = drained + 1, "drained batch after wait");
                return true;
            }
        }
    }

    fn finish(&mut self, state: CursorState) {
        self.current = None;
        self.batch.clear();
        if state == CursorState::Cancelled && self.rx.cancel() {
            debug!("generator cursor cancelled");
        }
        self.state = state;
        if let Some(finalizer) = self.finalizer.take() {
            debug!(?state, "finalizing generator cursor");
            finalizer.run();
        }
    }
}

impl<U> Drop for GeneratorCursor<U> {
    fn drop(&mut self) {
        if self.finalizer.is_some() {
            debug!("generator cursor dropped before completion");
            self.finish(CursorState::Cancelled);
        }
    }
}

impl<U> IntoIterator for GeneratorCursor<U> {
    type Item = U;
    type IntoIter = Sequence<U>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_sequence()
    }
}

impl<U> fmt::Debug for GeneratorCursor<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorCursor")
            .field("state", &self.state)
            .field("batched", &self.batch.len())
            .field("in_flight", &self.rx.len())
            .field("depth", &self.batch_size)
            .field("finalized", &self.finalizer.is_none())
            .finish()
    }
}
