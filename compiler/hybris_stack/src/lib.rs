//! Stack growth for deep recursion.
//!
//! Both the parser (nested expressions) and the engine (nested blocks and
//! script-level recursion) are recursive over the AST. Script recursion is
//! bounded by the engine's `max_recursion_depth`, but each script call costs
//! several native frames, so the native stack is grown on demand instead of
//! relying on the thread's default size.
//!
//! - **Native targets**: `stacker::maybe_grow`.
//! - **WASM targets**: passthrough.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each additional stack segment.
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if fewer than `RED_ZONE` bytes remain.
///
/// Wrap every recursive entry point (`parse_expr`, `evaluate`) with this.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
