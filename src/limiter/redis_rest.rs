// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Redis REST (Upstash-compatible) counter store.
//!
//! The whole check-and-increment runs as one Lua script, so concurrent
//! requests for the same key are serialized by Redis.

use super::store::{bucket_index, bucket_reset, RateLimitStore, WindowOutcome};
use crate::config::Secret;
use crate::error::StoreError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::trace;
use url::Url;

/// KEYS[1] current bucket, KEYS[2] previous bucket.
/// ARGV[1] limit, ARGV[2] now (ms), ARGV[3] window (ms).
/// Returns the remaining count, or -1 when the window is full.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local current = tonumber(redis.call("GET", KEYS[1]) or "0")
local previous = tonumber(redis.call("GET", KEYS[2]) or "0")
local limit = tonumber(ARGV[1])
local now = tonumber(ARGV[2])
local window = tonumber(ARGV[3])
local weighted = math.floor((1 - (now % window) / window) * previous)
if current + weighted >= limit then
  return -1
end
local updated = redis.call("INCR", KEYS[1])
if updated == 1 then
  redis.call("PEXPIRE", KEYS[1], window * 2 + 1000)
end
return limit - (updated + weighted)
"#;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Response envelope of the REST API.
#[derive(Debug, Deserialize)]
struct RestResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Redis REST client.
pub struct RedisRestStore {
    endpoint: Url,
    token: Secret,
    client: reqwest::Client,
}

impl RedisRestStore {
    /// Create a new REST store client.
    pub fn new(endpoint: Url, token: Secret) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            endpoint,
            token,
            client,
        })
    }

    /// Issue one command and return its `result`.
    async fn command(&self, args: &[String]) -> Result<serde_json::Value, StoreError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.token.expose())
            .json(args)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() && status != reqwest::StatusCode::BAD_REQUEST {
            return Err(StoreError::Status(status.as_u16()));
        }

        let body: RestResponse = response.json().await?;
        match (body.result, body.error) {
            (_, Some(error)) => Err(StoreError::Protocol(error)),
            (Some(result), None) => Ok(result),
            (None, None) => Err(StoreError::Protocol("empty response".to_string())),
        }
    }
}

#[async_trait]
impl RateLimitStore for RedisRestStore {
    async fn record(
        &self,
        key: &str,
        limit: u32,
        window_ms: i64,
        now_ms: i64,
    ) -> Result<WindowOutcome, StoreError> {
        let index = bucket_index(now_ms, window_ms);
        let args = eval_args(key, index, limit, window_ms, now_ms);

        let result = self.command(&args).await?;
        let remaining = result
            .as_i64()
            .ok_or_else(|| StoreError::Protocol(format!("unexpected script result: {result}")))?;
        trace!(key, remaining, "Sliding window evaluated");

        Ok(WindowOutcome {
            allowed: remaining >= 0,
            remaining: remaining.clamp(0, i64::from(limit)) as u32,
            reset_at_ms: bucket_reset(now_ms, window_ms),
        })
    }
}

fn eval_args(key: &str, index: i64, limit: u32, window_ms: i64, now_ms: i64) -> Vec<String> {
    vec![
        "EVAL".to_string(),
        SLIDING_WINDOW_SCRIPT.to_string(),
        "2".to_string(),
        format!("{key}:{index}"),
        format!("{key}:{}", index - 1),
        limit.to_string(),
        now_ms.to_string(),
        window_ms.to_string(),
    ]
}
