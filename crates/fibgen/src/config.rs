//! Application configuration from CLI flags and environment.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use num_bigint::BigUint;

use fibgen_core::constants::DEFAULT_BUFFER_DEPTH;

/// How the generated values are consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Operation {
    /// Collect every value through the iterator adapter.
    StreamAll,
    /// Filter a subset through the iterator adapter, then cancel.
    StreamCancel,
    /// Collect every value by driving the cursor directly.
    IterAll,
    /// Filter a subset by driving the cursor directly, then cancel.
    IterCancel,
}

impl Operation {
    /// The name used on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::StreamAll => "stream-all",
            Self::StreamCancel => "stream-cancel",
            Self::IterAll => "iter-all",
            Self::IterCancel => "iter-cancel",
        }
    }

    /// Whether this mode filters a subset and cancels early.
    #[must_use]
    pub fn cancels(self) -> bool {
        matches!(self, Self::StreamCancel | Self::IterCancel)
    }
}

/// Output format for the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// fibgen — generate Fibonacci values on a background thread and consume
/// them through a bounded pull iterator.
#[derive(Parser, Debug)]
#[command(name = "fibgen", version, about)]
pub struct AppConfig {
    /// Largest Fibonacci value to generate.
    #[arg(env = "FIBGEN_CEILING", required_unless_present = "completion")]
    pub ceiling: Option<BigUint>,

    /// How the values are consumed.
    #[arg(value_enum, default_value_t = Operation::StreamAll)]
    pub operation: Operation,

    /// Capacity of the handoff buffer between generator and consumer.
    #[arg(long, default_value_t = DEFAULT_BUFFER_DEPTH, env = "FIBGEN_DEPTH")]
    pub depth: usize,

    /// How long the consumer waits before re-checking the generator (e.g. "500ms", "5s").
    #[arg(long, default_value = "5s", value_parser = parse_poll_interval)]
    pub poll_interval: Duration,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also write the values to this file, one per line.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Verbose output (debug logging, full-length values).
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode (only output the values).
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

fn parse_poll_interval(s: &str) -> Result<Duration, String> {
    parse_duration(s)
        .ok_or_else(|| format!("invalid duration \"{s}\" (expected e.g. 250ms, 5s, 2m, 1h)"))
}

/// Parse a duration string like "5m", "1h", "30s", "250ms".
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        let n: u64 = ms.parse().ok()?;
        Some(Duration::from_millis(n))
    } else if let Some(mins) = s.strip_suffix('m') {
        let n: u64 = mins.parse().ok()?;
        Some(Duration::from_secs(n.checked_mul(60)?))
    } else if let Some(hours) = s.strip_suffix('h') {
        let n: u64 = hours.parse().ok()?;
        Some(Duration::from_secs(n.checked_mul(3600)?))
    } else if let Some(secs) = s.strip_suffix('s') {
        let n: u64 = secs.parse().ok()?;
        Some(Duration::from_secs(n))
    } else {
        let n: u64 = s.parse().ok()?;
        Some(Duration::from_secs(n))
    }
}
