// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Stack headroom for the recursive encoder and decoder.
//!
//! Nesting is bounded by `max_depth`, not by the thread's stack: once less
//! than [`RED_ZONE`] bytes remain, the next level runs on a fresh heap
//! segment of [`SEGMENT_SIZE`] bytes.

/// Remaining stack below which a new segment is allocated.
const RED_ZONE: usize = 128 * 1024;

/// Size of each additional stack segment.
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run one level of recursion with guaranteed stack headroom.
#[inline]
pub(crate) fn grow<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}
