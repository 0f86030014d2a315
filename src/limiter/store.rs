// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Counter store abstraction for the sliding window limiter.
//!
//! The window is approximated with two fixed buckets: the current one and
//! the one before it. The previous bucket contributes in proportion to how
//! much of it still overlaps the trailing window.

use crate::error::StoreError;
use async_trait::async_trait;

/// Outcome of recording one event against a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowOutcome {
    /// Whether the event fit within the limit (and was counted)
    pub allowed: bool,
    /// Events still available in the trailing window
    pub remaining: u32,
    /// Unix time in milliseconds when the current bucket ends
    pub reset_at_ms: i64,
}

/// Trait for rate limit counter stores.
///
/// Implementations must record and evaluate atomically per key so that
/// concurrent requests from one client are all accounted for.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record one event for `key` if the sliding window has room.
    async fn record(
        &self,
        key: &str,
        limit: u32,
        window_ms: i64,
        now_ms: i64,
    ) -> Result<WindowOutcome, StoreError>;

    /// Drop expired state. Remote stores expire keys themselves.
    async fn cleanup(&self, _now_ms: i64) {}
}

/// Index of the fixed bucket containing `now_ms`.
pub(crate) fn bucket_index(now_ms: i64, window_ms: i64) -> i64 {
    now_ms.div_euclid(window_ms)
}

/// End of the fixed bucket containing `now_ms`.
pub(crate) fn bucket_reset(now_ms: i64, window_ms: i64) -> i64 {
    (bucket_index(now_ms, window_ms) + 1) * window_ms
}

/// Share of the previous bucket still inside the trailing window.
pub(crate) fn weighted_previous(previous: u32, now_ms: i64, window_ms: i64) -> u32 {
    let elapsed = now_ms.rem_euclid(window_ms) as f64 / window_ms as f64;
    ((1.0 - elapsed) * previous as f64).floor() as u32
}
