//! Error types for runner configuration and generator execution.

/// Error raised by [`RunnerBuilder::build`](crate::builder::RunnerBuilder::build)
/// before any background work starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No generator function was supplied.
    #[error("invalid runner configuration: generator function not set")]
    MissingGenerator,

    /// No completion callback was supplied.
    #[error("invalid runner configuration: completion callback not set")]
    MissingCompletionHandler,

    /// No exception handler was supplied.
    #[error("invalid runner configuration: exception handler not set")]
    MissingExceptionHandler,

    /// The buffer depth must hold at least one value.
    #[error("invalid runner configuration: buffer depth must be at least 1, got {0}")]
    InvalidBufferDepth(usize),

    /// The producer thread could not be started.
    #[error("failed to spawn producer thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Returned by [`Yield::send`](crate::channel::Yield::send) once the consumer
/// has cancelled the run. The value passed to `send` is dropped.
///
/// Propagating it out of a generator with `?` ends the run quietly: the
/// producer records an abort, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("generator cancelled by consumer")]
pub struct Cancelled;

/// A panic raised inside a generator function, delivered to the
/// exception handler in place of a returned error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("generator panicked: {message}")]
pub struct GeneratorPanic {
    message: String,
}

impl GeneratorPanic {
    pub(crate) fn from_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }

    /// The panic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
