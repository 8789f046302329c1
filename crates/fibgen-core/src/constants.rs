//! Constants for runner configuration and process exit codes.

use std::time::Duration;

/// Default capacity of the handoff buffer between producer and consumer.
pub const DEFAULT_BUFFER_DEPTH: usize = 10;

/// Default interval a cursor waits for a value before re-checking
/// whether the producer has finished.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Prefix of producer thread names.
pub const PRODUCER_THREAD_PREFIX: &str = "fibgen-producer";

/// Exit codes for the `fibgen` binary.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// The generator function failed.
    pub const ERROR_GENERIC: i32 = 1;
    /// Invalid configuration.
    pub const ERROR_CONFIG: i32 = 4;
    /// Generation interrupted by the user (Ctrl+C).
    pub const ERROR_CANCELED: i32 = 130;
}
