// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding window rate limiting for contact form submissions.
//!
//! The gate is either enabled with a policy and a counter store, or
//! disabled (no backend configured), in which case every request passes.
//! Backend failures are resolved by the configured [`FailureMode`].

pub mod memory;
pub mod redis_rest;
pub mod store;

pub use memory::MemoryStore;
pub use redis_rest::RedisRestStore;
pub use store::{RateLimitStore, WindowOutcome};

use crate::config::{FailureMode, RateLimitBackend, RateLimitConfig};
use crate::error::StoreError;
use crate::identity::ClientIdentity;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request is allowed
    Allowed {
        /// Remaining submissions in the window, when known
        remaining: Option<u32>,
    },
    /// Backend failed and the gate is fail-open
    FailedOpen,
    /// Request is rate limited
    Limited {
        /// Whole seconds until the client may retry (at least 1)
        retry_after_secs: u64,
    },
    /// Backend failed and the gate is fail-closed
    FailedClosed,
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. } | Self::FailedOpen)
    }

    pub fn remaining(&self) -> Option<u32> {
        match self {
            Self::Allowed { remaining } => *remaining,
            _ => None,
        }
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::Limited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }

    /// Whether the backend could not be consulted.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::FailedOpen | Self::FailedClosed)
    }
}

/// An enabled limiter: policy plus counter store.
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given policy and store.
    pub fn new(config: RateLimitConfig, store: Arc<dyn RateLimitStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check the limit for a client at the current wall-clock time.
    pub async fn check(&self, identity: &ClientIdentity) -> RateLimitDecision {
        self.check_at(identity, chrono::Utc::now().timestamp_millis())
            .await
    }

    /// Check the limit for a client at `now_ms` (Unix milliseconds).
    pub async fn check_at(&self, identity: &ClientIdentity, now_ms: i64) -> RateLimitDecision {
        let key = self.config.key_for(identity.as_str());
        let window_ms = self.config.window_ms();

        match self
            .store
            .record(&key, self.config.max_requests, window_ms, now_ms)
            .await
        {
            Ok(outcome) if outcome.allowed => {
                debug!(client = %identity, remaining = outcome.remaining, "Rate limit check passed");
                RateLimitDecision::Allowed {
                    remaining: Some(outcome.remaining),
                }
            }
            Ok(outcome) => {
                let retry_after_secs = retry_after_secs(outcome.reset_at_ms, now_ms);
                debug!(client = %identity, retry_after_secs, "Rate limit exceeded");
                RateLimitDecision::Limited { retry_after_secs }
            }
            Err(err) => self.on_backend_error(identity, err),
        }
    }

    fn on_backend_error(&self, identity: &ClientIdentity, err: StoreError) -> RateLimitDecision {
        match self.config.failure_mode {
            FailureMode::Open => {
                warn!(client = %identity, error = %err, "Rate limit backend unavailable, allowing request");
                RateLimitDecision::FailedOpen
            }
            FailureMode::Closed => {
                warn!(client = %identity, error = %err, "Rate limit backend unavailable, rejecting request");
                RateLimitDecision::FailedClosed
            }
        }
    }

    /// Drop expired counters held by the store.
    pub async fn cleanup(&self) {
        self.store
            .cleanup(chrono::Utc::now().timestamp_millis())
            .await;
    }
}

/// `ceil((reset - now) / 1000)`, never below one second.
fn retry_after_secs(reset_at_ms: i64, now_ms: i64) -> u64 {
    let wait_ms = (reset_at_ms - now_ms).max(0) as u64;
    wait_ms.div_ceil(1000).max(1)
}

/// The rate limit gate.
pub enum RateLimiting {
    Enabled(RateLimiter),
    Disabled,
}

impl RateLimiting {
    /// Build the gate from configuration; no backend means disabled.
    pub fn from_config(
        config: &RateLimitConfig,
        backend: Option<&RateLimitBackend>,
    ) -> Result<Self, StoreError> {
        let store: Arc<dyn RateLimitStore> = match backend {
            None => return Ok(Self::Disabled),
            Some(RateLimitBackend::Memory) => Arc::new(MemoryStore::new()),
            Some(RateLimitBackend::Remote { url, token }) => {
                Arc::new(RedisRestStore::new(url.clone(), token.clone())?)
            }
        };
        Ok(Self::Enabled(RateLimiter::new(config.clone(), store)))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    pub async fn check(&self, identity: &ClientIdentity) -> RateLimitDecision {
        match self {
            Self::Enabled(limiter) => limiter.check(identity).await,
            Self::Disabled => RateLimitDecision::Allowed { remaining: None },
        }
    }

    pub async fn cleanup(&self) {
        if let Self::Enabled(limiter) = self {
            limiter.cleanup().await;
        }
    }
}
