//! Subset filter used by the cancelling operations.

use num_bigint::BigUint;

/// Lower bound (exclusive) of the kept subset.
pub const SUBSET_LOWER: u64 = 10_000;

/// Upper bound (exclusive) of the kept subset. The first value above it
/// cancels the generator.
pub const SUBSET_UPPER: u64 = 1_000_000_000;

/// What to do with one generated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Skip,
    /// Skip the value and stop the generator.
    Stop,
}

/// Keeps values strictly inside `(lower, upper)` and asks to stop on the
/// first value strictly above `upper`.
#[derive(Debug, Clone)]
pub struct SubsetFilter {
    lower: BigUint,
    upper: BigUint,
}

impl SubsetFilter {
    #[must_use]
    pub fn new(lower: impl Into<BigUint>, upper: impl Into<BigUint>) -> Self {
        Self {
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    /// Classify `value`.
    #[must_use]
    pub fn check(&self, value: &BigUint) -> Verdict {
        if value > &self.lower && value < &self.upper {
            Verdict::Keep
        } else if value > &self.upper {
            Verdict::Stop
        } else {
            Verdict::Skip
        }
    }
}

impl Default for SubsetFilter {
    fn default() -> Self {
        Self::new(SUBSET_LOWER, SUBSET_UPPER)
    }
}
