//! Host stack growth for the recursive parser and evaluator.
//!
//! Deeply nested source recurses on the host stack. Before each recursive step
//! we make sure a red zone is still available and otherwise move onto a freshly
//! allocated segment.

/// Minimum stack space to keep available.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
