//! End-to-end scenarios for the generator runner.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use num_bigint::BigUint;

use fibgen_core::{fibonacci, CursorState, GeneratorCursor, Runner, Yield};

#[derive(Clone, Default)]
struct Counters {
    completions: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
}

impl Counters {
    fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }

    fn errors(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }
}

fn fibonacci_cursor(
    ceiling: u64,
    counters: &Counters,
    yields: &Arc<AtomicU64>,
) -> GeneratorCursor<BigUint> {
    let completions = Arc::clone(&counters.completions);
    let errors = Arc::clone(&counters.errors);
    let yields = Arc::clone(yields);
    Runner::run_seeded(BigUint::from(ceiling), move |ceiling, y| {
        let result = fibonacci::yield_up_to(&ceiling, y);
        yields.store(y.sent_count(), Ordering::SeqCst);
        result.map(|_| ())
    })
    .on_completion(move || {
        completions.fetch_add(1, Ordering::SeqCst);
    })
    .on_exception(move |_| {
        errors.fetch_add(1, Ordering::SeqCst);
    })
    .build()
    .unwrap()
}

fn to_u64(values: &[BigUint]) -> Vec<u64> {
    values.iter().map(|v| u64::try_from(v).unwrap()).collect()
}

#[test]
fn seed_thirty_yields_nine_values() {
    let counters = Counters::default();
    let yields = Arc::new(AtomicU64::new(0));
    let values: Vec<BigUint> = fibonacci_cursor(30, &counters, &yields)
        .into_sequence()
        .collect();

    assert_eq!(to_u64(&values), [0, 1, 1, 2, 3, 5, 8, 13, 21]);
    assert_eq!(values.len(), 9);
    assert_eq!(yields.load(Ordering::SeqCst), 9);
    assert_eq!(counters.completions(), 1);
    assert_eq!(counters.errors(), 0);
}

#[test]
fn filter_cancels_on_first_value_over_limit() {
    let counters = Counters::default();
    let yields = Arc::new(AtomicU64::new(0));
    let mut seq = fibonacci_cursor(2_000_000_000, &counters, &yields).into_sequence();
    let stop = seq.cancel_handle();
    let lower = BigUint::from(10_000u32);
    let upper = BigUint::from(1_000_000_000u32);

    let subset: Vec<BigUint> = seq
        .by_ref()
        .filter(|v| {
            if *v > lower && *v < upper {
                return true;
            }
            if *v > upper {
                stop.cancel();
            }
            false
        })
        .collect();

    let subset = to_u64(&subset);
    assert_eq!(subset.first(), Some(&10_946));
    assert_eq!(subset.last(), Some(&701_408_733));
    assert_eq!(subset.len(), 24);
    assert_eq!(seq.state(), CursorState::Cancelled);
    drop(seq);
    assert_eq!(counters.completions(), 1);
    assert_eq!(counters.errors(), 0);
}

#[test]
fn direct_cursor_cancel_from_loop() {
    let counters = Counters::default();
    let yields = Arc::new(AtomicU64::new(0));
    let mut cursor = fibonacci_cursor(2_000_000_000, &counters, &yields);
    let limit = BigUint::from(1_000_000_000u32);
    let mut kept = 0;
    while cursor.advance() {
        if cursor.current().is_some_and(|v| *v > limit) {
            cursor.cancel();
        } else {
            kept += 1;
        }
    }
    // F(0) through F(44) are at most one billion.
    assert_eq!(kept, 45);
    assert_eq!(counters.completions(), 1);
}

#[test]
fn cancellation_unblocks_depth_one_producer() {
    let completions = Arc::new(AtomicUsize::new(0));
    let done = Arc::clone(&completions);
    let mut cursor = Runner::run(|y: &Yield<u64>| {
        let mut n = 0;
        loop {
            y.send(n)?;
            n += 1;
        }
    })
    .buffer_depth(1)
    .on_completion(move || {
        done.fetch_add(1, Ordering::SeqCst);
    })
    .on_exception(|err| panic!("unexpected error: {err}"))
    .build()
    .unwrap();

    assert!(cursor.advance());
    std::thread::sleep(Duration::from_millis(50));

    let start = Instant::now();
    cursor.cancel();
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

#[test]
fn generator_error_after_k_values() {
    #[derive(Debug, thiserror::Error)]
    #[error("upstream closed")]
    struct UpstreamClosed;

    let seen_error = Arc::new(std::sync::Mutex::new(None::<String>));
    let slot = Arc::clone(&seen_error);
    let completions = Arc::new(AtomicUsize::new(0));
    let done = Arc::clone(&completions);

    let mut cursor = Runner::run(|y: &Yield<&'static str>| {
        y.send("alpha")?;
        y.send("beta")?;
        Err(UpstreamClosed.into())
    })
    .buffer_depth(1)
    .on_completion(move || {
        done.fetch_add(1, Ordering::SeqCst);
    })
    .on_exception(move |err| {
        assert!(err.is::<UpstreamClosed>());
        *slot.lock().unwrap() = Some(err.to_string());
    })
    .build()
    .unwrap();

    assert!(cursor.advance());
    assert_eq!(cursor.current(), Some(&"alpha"));
    assert!(cursor.advance());
    assert_eq!(cursor.current(), Some(&"beta"));
    assert!(!cursor.advance());
    assert_eq!(seen_error.lock().unwrap().as_deref(), Some("upstream closed"));
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}
