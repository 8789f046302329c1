//! Iterator view over a generator cursor.

use std::iter::FusedIterator;

use crate::channel::CancelHandle;
use crate::cursor::{CursorState, GeneratorCursor};

/// Lazy, ordered, single-pass iterator over a generator's values.
///
/// Each `next` is an `advance` followed by taking the current value. The
/// sequence ends when the generator finishes or the run is cancelled, so
/// it is finite exactly when one of those happens. Filtering logic that
/// wants to stop production early cancels through a [`CancelHandle`]:
///
/// ```
/// use fibgen_core::Runner;
///
/// let seq = Runner::run(|y| {
///     let mut n = 0u64;
///     loop {
///         y.send(n)?;
///         n += 1;
///     }
/// })
/// .on_completion(|| {})
/// .on_exception(|err| panic!("{err}"))
/// .build()
/// .unwrap()
/// .into_sequence();
///
/// let stop = seq.cancel_handle();
/// let small: Vec<u64> = seq
///     .filter(|&n| {
///         if n >= 5 {
///             stop.cancel();
///         }
///         n < 5
///     })
///     .collect();
/// assert_eq!(small, [0, 1, 2, 3, 4]);
/// ```
#[derive(Debug)]
pub struct Sequence<U> {
    cursor: GeneratorCursor<U>,
}

impl<U> Sequence<U> {
    pub(crate) fn new(cursor: GeneratorCursor<U>) -> Self {
        Self { cursor }
    }

    /// A handle that ends this sequence early from inside an adapter chain.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cursor.cancel_handle()
    }

    /// End the sequence now and run the completion protocol.
    pub fn cancel(&mut self) {
        self.cursor.cancel();
    }

    /// Lifecycle state of the underlying cursor.
    #[must_use]
    pub fn state(&self) -> CursorState {
        self.cursor.state()
    }

    /// Give back the underlying cursor.
    #[must_use]
    pub fn into_cursor(self) -> GeneratorCursor<U> {
        self.cursor
    }
}

impl<U> Iterator for Sequence<U> {
    type Item = U;

    fn next(&mut self) -> Option<U> {
        if self.cursor.advance() {
            self.cursor.take_current()
        } else {
            None
        }
    }
}

impl<U> FusedIterator for Sequence<U> {}
