// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types shared across the admission service.

use thiserror::Error;

/// Fatal startup errors raised while resolving configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Failures talking to the rate limit backend.
///
/// These never reach the client; the rate limit gate converts them
/// according to its failure mode.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rate limit backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rate limit backend returned status {0}")]
    Status(u16),

    #[error("rate limit backend protocol error: {0}")]
    Protocol(String),
}

/// Failure handing an accepted payload to the delivery collaborator.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}
