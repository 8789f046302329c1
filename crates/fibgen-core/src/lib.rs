//! # fibgen-core
//!
//! Run a push-style generator function on a background thread and
//! consume its values as a pull iterator. Values cross a bounded handoff
//! channel, so a fast generator blocks instead of growing memory, and a
//! one-shot completion protocol reports generator errors and completion
//! back on the consumer side.

pub mod builder;
pub mod channel;
pub mod constants;
pub mod cursor;
pub mod error;
pub mod fibonacci;
pub mod producer;
pub mod sequence;

// Re-exports
pub use builder::{Runner, RunnerBuilder};
pub use channel::{CancelHandle, ChannelState, Yield};
pub use constants::{exit_codes, DEFAULT_BUFFER_DEPTH, DEFAULT_POLL_INTERVAL};
pub use cursor::{CursorState, GeneratorCursor};
pub use error::{Cancelled, ConfigError, GeneratorPanic};
pub use sequence::Sequence;
