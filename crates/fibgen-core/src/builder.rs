//! Fluent configuration for generator runs.
//!
//! ```
//! use fibgen_core::Runner;
//!
//! let total: u32 = Runner::run_seeded(4u32, |limit, y| {
//!     for v in 1..=limit {
//!         y.send(v)?;
//!     }
//!     Ok(())
//! })
//! .buffer_depth(2)
//! .on_completion(|| println!("done"))
//! .on_exception(|err| eprintln!("generator failed: {err}"))
//! .build()
//! .unwrap()
//! .into_sequence()
//! .sum();
//! assert_eq!(total, 10);
//! ```

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::channel::{self, Yield};
use crate::constants::{DEFAULT_BUFFER_DEPTH, DEFAULT_POLL_INTERVAL};
use crate::cursor::{CompletionFn, ExceptionFn, GeneratorCursor};
use crate::error::ConfigError;
use crate::producer::{GeneratorFn, ProducerTask};

/// Shortest wait between producer-state checks.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Entry points for the common case of configuring a generator first.
pub struct Runner;

impl Runner {
    /// Start configuring a run of `generator`.
    pub fn run<U, F>(generator: F) -> RunnerBuilder<U>
    where
        U: Send + 'static,
        F: FnOnce(&Yield<U>) -> anyhow::Result<()> + Send + 'static,
    {
        RunnerBuilder::new().generator(generator)
    }

    /// Start configuring a run of `generator`, which receives `seed` as its
    /// starting input.
    pub fn run_seeded<T, U, F>(seed: T, generator: F) -> RunnerBuilder<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T, &Yield<U>) -> anyhow::Result<()> + Send + 'static,
    {
        RunnerBuilder::new().seeded_generator(seed, generator)
    }
}

/// Builder for a [`GeneratorCursor`].
///
/// A generator, a completion callback and an exception handler are
/// required; [`build`](Self::build) checks them in that order and fails
/// before any thread is started.
pub struct RunnerBuilder<U> {
    generator: Option<GeneratorFn<U>>,
    on_completion: Option<CompletionFn>,
    on_exception: Option<ExceptionFn>,
    buffer_depth: usize,
    poll_interval: Duration,
}

impl<U: Send + 'static> RunnerBuilder<U> {
    /// An empty builder with the default buffer depth and poll interval.
    #[must_use]
    pub fn new() -> Self {
        Self {
            generator: None,
            on_completion: None,
            on_exception: None,
            buffer_depth: DEFAULT_BUFFER_DEPTH,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the generator function.
    #[must_use]
    pub fn generator<F>(mut self, generator: F) -> Self
    where
        F: FnOnce(&Yield<U>) -> anyhow::Result<()> + Send + 'static,
    {
        self.generator = Some(Box::new(generator));
        self
    }

    /// Set a generator function parameterized by a seed value.
    #[must_use]
    pub fn seeded_generator<T, F>(mut self, seed: T, generator: F) -> Self
    where
        T: Send + 'static,
        F: FnOnce(T, &Yield<U>) -> anyhow::Result<()> + Send + 'static,
    {
        self.generator = Some(Box::new(move |y: &Yield<U>| generator(seed, y)));
        self
    }

    /// Capacity of the handoff buffer (default 10, must be at least 1).
    #[must_use]
    pub fn buffer_depth(mut self, depth: usize) -> Self {
        self.buffer_depth = depth;
        self
    }

    /// How long the cursor waits for a value before re-checking whether
    /// the producer has finished (default 5 seconds).
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Callback run exactly once when the cursor is exhausted or cancelled.
    #[must_use]
    pub fn on_completion<F>(mut self, completion: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_completion = Some(Box::new(completion));
        self
    }

    /// Handler receiving the error the generator failed with, if any.
    ///
    /// Not called when the cursor is dropped while its thread is already
    /// panicking; the error is logged instead and completion still runs.
    #[must_use]
    pub fn on_exception<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(anyhow::Error) + Send + 'static,
    {
        self.on_exception = Some(Box::new(handler));
        self
    }

    /// Validate the configuration, start the producer and return its cursor.
    pub fn build(self) -> Result<GeneratorCursor<U>, ConfigError> {
        let Self {
            generator,
            on_completion,
            on_exception,
            buffer_depth,
            poll_interval,
        } = self;

        let generator = generator.ok_or(ConfigError::MissingGenerator)?;
        let on_completion = on_completion.ok_or(ConfigError::MissingCompletionHandler)?;
        let on_exception = on_exception.ok_or(ConfigError::MissingExceptionHandler)?;
        if buffer_depth == 0 {
            return Err(ConfigError::InvalidBufferDepth(buffer_depth));
        }

        let (tx, rx) = channel::bounded(buffer_depth);
        let producer = ProducerTask::spawn(generator, tx)?;
        debug!(
            producer = producer.id(),
            depth = buffer_depth,
            poll_ms = u64::try_from(poll_interval.as_millis()).unwrap_or(u64::MAX),
            "generator runner started"
        );
        Ok(GeneratorCursor::new(
            rx,
            producer,
            on_completion,
            on_exception,
            poll_interval,
        ))
    }
}

impl<U: Send + 'static> Default for RunnerBuilder<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> fmt::Debug for RunnerBuilder<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerBuilder")
            .field("generator", &self.generator.is_some())
            .field("on_completion", &self.on_completion.is_some())
            .field("on_exception", &self.on_exception.is_some())
            .field("buffer_depth", &self.buffer_depth)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
