// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! In-process sliding window store.

use super::store::{bucket_index, bucket_reset, weighted_previous, RateLimitStore, WindowOutcome};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Counts for one key.
#[derive(Debug)]
struct WindowCounts {
    /// Fixed bucket the counts belong to
    index: i64,
    /// Bucket length the counts were recorded with
    window_ms: i64,
    current: u32,
    previous: u32,
}

impl WindowCounts {
    /// Shift the buckets forward to `index`.
    fn roll(&mut self, index: i64) {
        if index == self.index {
            return;
        }
        self.previous = if index == self.index + 1 { self.current } else { 0 };
        self.current = 0;
        self.index = index;
    }
}

/// Thread-safe in-memory counter store.
///
/// Suitable for a single instance; counters are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    windows: RwLock<HashMap<String, WindowCounts>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently tracked.
    pub async fn len(&self) -> usize {
        self.windows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn record(
        &self,
        key: &str,
        limit: u32,
        window_ms: i64,
        now_ms: i64,
    ) -> Result<WindowOutcome, StoreError> {
        let index = bucket_index(now_ms, window_ms);
        let reset_at_ms = bucket_reset(now_ms, window_ms);

        let mut windows = self.windows.write().await;
        let counts = windows
            .entry(key.to_string())
            .or_insert_with(|| WindowCounts {
                index,
                window_ms,
                current: 0,
                previous: 0,
            });
        counts.window_ms = window_ms;
        counts.roll(index);

        let weighted = weighted_previous(counts.previous, now_ms, window_ms);
        if counts.current.saturating_add(weighted) >= limit {
            debug!(key, current = counts.current, weighted, "Sliding window full");
            return Ok(WindowOutcome {
                allowed: false,
                remaining: 0,
                reset_at_ms,
            });
        }

        counts.current += 1;
        Ok(WindowOutcome {
            allowed: true,
            remaining: limit.saturating_sub(counts.current.saturating_add(weighted)),
            reset_at_ms,
        })
    }

    async fn cleanup(&self, now_ms: i64) {
        let mut windows = self.windows.write().await;
        let before = windows.len();
        // Counts older than the previous bucket no longer affect any decision.
        windows.retain(|_, counts| bucket_index(now_ms, counts.window_ms) <= counts.index + 1);
        let removed = before - windows.len();
        if removed > 0 {
            debug!(removed, "Expired rate limit windows removed");
        }
    }
}
