//! Error handling and exit codes.

use fibgen_core::constants::exit_codes;
use fibgen_core::ConfigError;

/// Failures reported by the application after a run.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The generator function failed; the message is its error.
    #[error("generator failed: {0}")]
    Generator(String),

    /// The run was interrupted by Ctrl+C.
    #[error("generation interrupted")]
    Interrupted,
}

/// Map an application error to the process exit code.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(app) = err.downcast_ref::<AppError>() {
        match app {
            AppError::Generator(_) => exit_codes::ERROR_GENERIC,
            AppError::Interrupted => exit_codes::ERROR_CANCELED,
        }
    } else if err.downcast_ref::<ConfigError>().is_some() {
        exit_codes::ERROR_CONFIG
    } else {
        exit_codes::ERROR_GENERIC
    }
}
