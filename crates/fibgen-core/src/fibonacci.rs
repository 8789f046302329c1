//! Fibonacci generator functions.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use tracing::debug;

use crate::channel::Yield;

/// Unbounded Fibonacci values starting from F(0).
///
/// # Example
/// ```
/// use fibgen_core::fibonacci::FibIterator;
/// let fibs: Vec<_> = FibIterator::new().take(7).map(|v| v.to_string()).collect();
/// assert_eq!(fibs, ["0", "1", "1", "2", "3", "5", "8"]);
/// ```
pub struct FibIterator {
    current: BigUint,
    next: BigUint,
}

impl FibIterator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: BigUint::zero(),
            next: BigUint::one(),
        }
    }
}

impl Default for FibIterator {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for FibIterator {
    type Item = BigUint;

    fn next(&mut self) -> Option<BigUint> {
        let after = &self.current + &self.next;
        let next = std::mem::replace(&mut self.next, after);
        Some(std::mem::replace(&mut self.current, next))
    }
}

/// Yield every Fibonacci number not greater than `ceiling`, in order.
///
/// Returns how many values were yielded. Stops with
/// [`Cancelled`](crate::error::Cancelled) as soon as the consumer cancels.
pub fn yield_up_to(ceiling: &BigUint, y: &Yield<BigUint>) -> anyhow::Result<u64> {
    debug!(%ceiling, "fibonacci generator invoked");
    let mut count = 0;
    for value in FibIterator::new() {
        if &value > ceiling {
            break;
        }
        y.send(value)?;
        count += 1;
    }
    Ok(count)
}

/// Yield the Fibonacci sequence without end. Only cancellation stops it.
pub fn yield_unbounded(y: &Yield<BigUint>) -> anyhow::Result<()> {
    for value in FibIterator::new() {
        y.send(value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Runner;

    fn run_up_to(ceiling: u64) -> Vec<u64> {
        Runner::run_seeded(BigUint::from(ceiling), |c, y| {
            yield_up_to(&c, y)?;
            Ok(())
        })
        .on_completion(|| {})
        .on_exception(|err| panic!("{err}"))
        .build()
        .unwrap()
        .into_sequence()
        .map(|v| u64::try_from(v).unwrap())
        .collect()
    }

    #[test]
    fn first_ten() {
        let vals: Vec<u64> = FibIterator::new()
            .take(10)
            .map(|v| u64::try_from(v).unwrap())
            .collect();
        assert_eq!(vals, [0, 1, 1, 2, 3, 5, 8, 13, 21, 34]);
    }

    #[test]
    fn hundredth_value() {
        let f100 = FibIterator::new().nth(100).unwrap();
        assert_eq!(f100.to_string(), "354224848179261915075");
    }

    #[test]
    fn up_to_thirty() {
        assert_eq!(run_up_to(30), [0, 1, 1, 2, 3, 5, 8, 13, 21]);
    }

    #[test]
    fn up_to_zero() {
        assert_eq!(run_up_to(0), [0]);
    }

    #[test]
    fn up_to_one() {
        assert_eq!(run_up_to(1), [0, 1, 1]);
    }

    #[test]
    fn ceiling_on_a_fibonacci_number_is_inclusive() {
        assert_eq!(*run_up_to(55).last().unwrap(), 55);
    }

    #[test]
    fn unbounded_runs_until_cancelled() {
        let mut cursor = Runner::run(yield_unbounded)
            .buffer_depth(2)
            .on_completion(|| {})
            .on_exception(|err| panic!("{err}"))
            .build()
            .unwrap();
        let mut seen = 0;
        while cursor.advance() {
            seen += 1;
            if seen == 100 {
                cursor.cancel();
            }
        }
        assert_eq!(seen, 100);
    }
}
