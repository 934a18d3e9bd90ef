//! Chunk partitioning
//!
//! Card-level judging submits cards in bounded batches; this is the one
//! place that decides the batch boundaries.

/// Split `items` into contiguous chunks of at most `size` elements.
///
/// Order is preserved and every element lands in exactly one chunk; the
/// final chunk may be shorter. `size` must be positive.
pub fn partition<T>(items: &[T], size: usize) -> Vec<&[T]> {
    assert!(size > 0, "chunk size must be positive");
    items.chunks(size).collect()
}
