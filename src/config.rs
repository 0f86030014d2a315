// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact admission service.
//!
//! Resolved once at startup from environment variables and passed by value
//! into everything that needs it. Required keys abort startup when missing;
//! the rate limit backend is optional and its absence disables the gate.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Largest window whose bucket arithmetic stays within `i64` milliseconds.
pub const MAX_WINDOW_MS: i64 = i64::MAX / 2;

/// A secret value that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

/// Configuration for the contact admission service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    pub bind_addr: String,

    /// Mail sender/recipient settings handed to the delivery collaborator
    pub mail: MailConfig,

    /// Secret used by the external verification collaborator
    pub verification_secret: Secret,

    /// Rate limiting policy
    pub rate_limit: RateLimitConfig,

    /// Rate limit backend; `None` disables rate limiting
    pub rate_limit_backend: Option<RateLimitBackend>,

    /// Origins allowed to post the form cross-origin
    pub allowed_origins: Vec<String>,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Mail delivery settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub region: String,
    pub access_key_id: Secret,
    pub secret_access_key: Secret,
    pub from_address: String,
    pub from_name: String,
    pub to_address: String,
}

/// Where rate limit counters live.
#[derive(Debug, Clone)]
pub enum RateLimitBackend {
    /// Redis REST endpoint (Upstash-compatible)
    Remote { url: Url, token: Secret },
    /// In-process counters, for single-node deployments
    Memory,
}

/// What the rate limit gate does when its backend cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Allow the request
    #[default]
    Open,
    /// Reject the request
    Closed,
}

impl FromStr for FailureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(format!("expected \"open\" or \"closed\", got {other:?}")),
        }
    }
}

/// Sliding window rate limit policy.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum accepted submissions per window per client (default: 5)
    pub max_requests: u32,

    /// Window length in seconds (default: 3600)
    pub window_secs: u64,

    /// Key prefix in the backend (default: ratelimit:email)
    pub prefix: String,

    /// Behaviour on backend failure (default: open)
    pub failure_mode: FailureMode,
}

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_requests() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    3600
}

fn default_prefix() -> String {
    "ratelimit:email".to_string()
}

fn default_from_name() -> String {
    "Contact Form".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            prefix: default_prefix(),
            failure_mode: FailureMode::default(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Window length in milliseconds, clamped to `1..=MAX_WINDOW_MS`.
    pub fn window_ms(&self) -> i64 {
        i64::try_from(self.window_duration().as_millis())
            .map_or(MAX_WINDOW_MS, |ms| ms.clamp(1, MAX_WINDOW_MS))
    }

    /// Backend key for a client identity.
    pub fn key_for(&self, identity: &str) -> String {
        format!("{}:{}", self.prefix, identity)
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let mail = MailConfig {
            region: env.required("AWS_REGION")?,
            access_key_id: Secret::new(env.required("AWS_ACCESS_KEY_ID")?),
            secret_access_key: Secret::new(env.required("AWS_SECRET_ACCESS_KEY")?),
            from_address: env.required("EMAIL_FROM")?,
            from_name: env.optional("EMAIL_FROM_NAME").unwrap_or_else(default_from_name),
            to_address: env.required("EMAIL_TO")?,
        };
        let verification_secret = Secret::new(env.required("RECAPTCHA_SECRET_KEY")?);

        let rate_limit = RateLimitConfig {
            max_requests: env.parsed("RATE_LIMIT_MAX", default_max_requests())?,
            window_secs: env.parsed("RATE_LIMIT_WINDOW_SECS", default_window_secs())?,
            prefix: env.optional("RATE_LIMIT_PREFIX").unwrap_or_else(default_prefix),
            failure_mode: env.parsed("RATE_LIMIT_FAILURE_MODE", FailureMode::default())?,
        };
        if rate_limit.max_requests == 0 {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_MAX",
                reason: "must be greater than zero".to_string(),
            });
        }
        if rate_limit.window_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_WINDOW_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }
        let window_fits = rate_limit
            .window_secs
            .checked_mul(1000)
            .is_some_and(|ms| ms <= MAX_WINDOW_MS as u64);
        if !window_fits {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_WINDOW_SECS",
                reason: format!("must be at most {} seconds", MAX_WINDOW_MS / 1000),
            });
        }

        let rate_limit_backend = resolve_backend(&env)?;

        let allowed_origins = env
            .optional("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(parse_origin)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        let metrics = MetricsConfig {
            enabled: env.parsed("METRICS_ENABLED", default_true())?,
            path: env.optional("METRICS_PATH").unwrap_or_else(default_metrics_path),
        };
        if !metrics.path.starts_with('/') {
            return Err(ConfigError::Invalid {
                key: "METRICS_PATH",
                reason: "must start with '/'".to_string(),
            });
        }

        Ok(Self {
            bind_addr: env.optional("BIND_ADDR").unwrap_or_else(default_bind_addr),
            mail,
            verification_secret,
            rate_limit,
            rate_limit_backend,
            allowed_origins,
            metrics,
        })
    }
}

fn resolve_backend<F>(env: &Env<F>) -> Result<Option<RateLimitBackend>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(kind) = env.optional("RATE_LIMIT_BACKEND") {
        match kind.to_ascii_lowercase().as_str() {
            "memory" => return Ok(Some(RateLimitBackend::Memory)),
            "remote" => {}
            other => {
                return Err(ConfigError::Invalid {
                    key: "RATE_LIMIT_BACKEND",
                    reason: format!("expected \"remote\" or \"memory\", got {other:?}"),
                })
            }
        }
    }

    match (
        env.optional("UPSTASH_REDIS_REST_URL"),
        env.optional("UPSTASH_REDIS_REST_TOKEN"),
    ) {
        (Some(url), Some(token)) => {
            let url = Url::parse(&url).map_err(|e| ConfigError::Invalid {
                key: "UPSTASH_REDIS_REST_URL",
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                return Err(ConfigError::Invalid {
                    key: "UPSTASH_REDIS_REST_URL",
                    reason: "must be an http(s) URL with a host".to_string(),
                });
            }
            Ok(Some(RateLimitBackend::Remote {
                url,
                token: Secret::new(token),
            }))
        }
        (None, None) => Ok(None),
        (url, _) => {
            let missing = if url.is_some() {
                "UPSTASH_REDIS_REST_TOKEN"
            } else {
                "UPSTASH_REDIS_REST_URL"
            };
            tracing::warn!(missing, "Incomplete rate limit backend credentials, rate limiting disabled");
            Ok(None)
        }
    }
}

/// An http(s) origin: scheme and host, optional port, nothing else.
fn parse_origin(origin: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        key: "ALLOWED_ORIGINS",
        reason: format!("{origin:?} {reason}"),
    };

    let url = Url::parse(origin).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid("must be an http(s) origin"));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not carry a path, query or fragment"));
    }
    Ok(origin.trim_end_matches('/').to_string())
}

/// Key lookup with required/optional semantics. Empty values count as unset.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }
}
