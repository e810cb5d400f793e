//! Stack growth for deeply nested `Apply` trees.
//!
//! Policies are loaded from outside and can nest function applications
//! arbitrarily deep; each `Apply` level runs through `nested_apply`.

/// Free stack below which a new segment is allocated.
#[cfg(not(target_arch = "wasm32"))]
const MIN_FREE_STACK: usize = 64 * 1024;

/// Size of each newly allocated segment.
#[cfg(not(target_arch = "wasm32"))]
const SEGMENT_SIZE: usize = 1024 * 1024;

/// Run one level of nested evaluation, growing the stack first if needed.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn nested_apply<R>(eval: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(MIN_FREE_STACK, SEGMENT_SIZE, eval)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn nested_apply<R>(eval: impl FnOnce() -> R) -> R {
    eval()
}
