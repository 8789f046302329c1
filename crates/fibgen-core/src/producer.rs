//! Background execution of a generator function.
//!
//! Each cursor owns exactly one [`ProducerTask`]: a named thread that runs
//! the generator with the producer half of the handoff channel, records
//! how it ended, and always marks the channel finished on the way out.

use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::channel::Yield;
use crate::constants::PRODUCER_THREAD_PREFIX;
use crate::error::{Cancelled, GeneratorPanic};

/// A boxed generator function ready to run on the producer thread.
pub type GeneratorFn<U> = Box<dyn FnOnce(&Yield<U>) -> anyhow::Result<()> + Send + 'static>;

static NEXT_PRODUCER_ID: AtomicU64 = AtomicU64::new(1);

/// How a producer run ended.
pub enum ProducerOutcome {
    /// The generator returned normally.
    Completed,
    /// The generator returned an error or panicked.
    Failed(anyhow::Error),
    /// The run was cancelled before the generator finished.
    Aborted,
}

impl ProducerOutcome {
    /// The captured error, if the run failed.
    #[must_use]
    pub fn into_error(self) -> Option<anyhow::Error> {
        match self {
            Self::Failed(err) => Some(err),
            Self::Completed | Self::Aborted => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed(_) => "failed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Debug for ProducerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(err) => f.debug_tuple("Failed").field(&format_args!("{err}")).finish(),
            other => f.write_str(other.label()),
        }
    }
}

/// Handle to a running generator.
pub struct ProducerTask {
    id: u64,
    handle: JoinHandle<ProducerOutcome>,
}

impl ProducerTask {
    /// Start `generator` on a new producer thread feeding `tx`.
    pub fn spawn<U: Send + 'static>(generator: GeneratorFn<U>, tx: Yield<U>) -> io::Result<Self> {
        let id = NEXT_PRODUCER_ID.fetch_add(1, Ordering::Relaxed);
        let handle = thread::Builder::new()
            .name(format!("{PRODUCER_THREAD_PREFIX}-{id}"))
            .spawn(move || run_generator(id, generator, tx))?;
        Ok(Self { id, handle })
    }

    /// Identifier used in log events and the thread name.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the producer thread has reached its terminal state.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the producer to finish and return its outcome.
    pub fn join(self) -> ProducerOutcome {
        match self.handle.join() {
            Ok(outcome) => outcome,
            // Generator panics are caught inside the thread; this only
            // covers a panic in the bookkeeping around it.
            Err(payload) => {
                ProducerOutcome::Failed(GeneratorPanic::from_payload(payload.as_ref()).into())
            }
        }
    }
}

fn run_generator<U>(id: u64, generator: GeneratorFn<U>, tx: Yield<U>) -> ProducerOutcome {
    debug!(producer = id, "generator started");

    let result = panic::catch_unwind(AssertUnwindSafe(|| generator(&tx)));
    let outcome = match result {
        Ok(Ok(())) if tx.is_cancelled() => ProducerOutcome::Aborted,
        Ok(Ok(())) => ProducerOutcome::Completed,
        Ok(Err(err)) if caused_by_cancel(&err) => ProducerOutcome::Aborted,
        Ok(Err(err)) => {
            warn!(producer = id, error = %err, "generator failed");
            ProducerOutcome::Failed(err)
        }
        Err(payload) => {
            let panic = GeneratorPanic::from_payload(payload.as_ref());
            warn!(producer = id, error = %panic, "generator panicked");
            ProducerOutcome::Failed(panic.into())
        }
    };

    tx.mark_producer_done();
    debug!(
        producer = id,
        yielded = tx.sent_count(),
        outcome = outcome.label(),
        "generator finished"
    );
    outcome
}

/// A [`Cancelled`] anywhere in the chain, including under added context.
fn caused_by_cancel(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<Cancelled>())
}
