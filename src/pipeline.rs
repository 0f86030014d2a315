// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Admission pipeline for contact form submissions.
//!
//! RECEIVED -> RATE_CHECKED -> SANITIZED -> VALIDATED -> ACCEPTED, with
//! REJECTED reachable after the rate check and after validation. A
//! rejection skips every later stage. Sanitizing is total, so it never
//! rejects.

use crate::identity::ClientIdentity;
use crate::limiter::{RateLimitDecision, RateLimiting};
use crate::metrics::AdmissionMetrics;
use crate::sanitize::sanitize_submission;
use crate::submission::{RawSubmission, ValidatedContactPayload};
use crate::validator::{ContactValidator, ValidationErrors};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Pipeline stage that produced a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RateLimit,
    Validate,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimit => "rate_limit",
            Self::Validate => "validate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a submission is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionState {
    Received,
    RateChecked,
    Sanitized,
    Validated,
    Accepted,
    Rejected,
}

/// Why a submission was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("rate limit backend unavailable")]
    RateLimitUnavailable,

    #[error(transparent)]
    Invalid(ValidationErrors),
}

impl Rejection {
    pub fn stage(&self) -> Stage {
        match self {
            Self::RateLimited { .. } | Self::RateLimitUnavailable => Stage::RateLimit,
            Self::Invalid(_) => Stage::Validate,
        }
    }

    /// Machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::RateLimitUnavailable => "rate_limit_unavailable",
            Self::Invalid(_) => "invalid_submission",
        }
    }

    /// Retry hint; only rate limit rejections carry one.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

/// An accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admitted {
    pub payload: ValidatedContactPayload,
    /// Remaining submissions for this client, when the limiter knows
    pub remaining: Option<u32>,
}

/// Rate limit, sanitize and validate, in that order.
pub struct AdmissionPipeline {
    rate_limiting: RateLimiting,
    validator: ContactValidator,
    metrics: Option<Arc<AdmissionMetrics>>,
}

impl AdmissionPipeline {
    pub fn new(rate_limiting: RateLimiting) -> Self {
        Self {
            rate_limiting,
            validator: ContactValidator::new(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<AdmissionMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn rate_limiting(&self) -> &RateLimiting {
        &self.rate_limiting
    }

    /// Run a submission through every stage.
    pub async fn admit(
        &self,
        identity: &ClientIdentity,
        raw: &RawSubmission,
    ) -> Result<Admitted, Rejection> {
        let result = self.run(identity, raw).await;

        match &result {
            Ok(_) => {
                transition(identity, AdmissionState::Accepted);
                if let Some(metrics) = &self.metrics {
                    metrics.record_accepted();
                }
            }
            Err(rejection) => {
                transition(identity, AdmissionState::Rejected);
                info!(
                    client = %identity,
                    stage = %rejection.stage(),
                    reason = rejection.reason(),
                    retry_after_secs = rejection.retry_after_secs(),
                    "Submission rejected"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_rejected(rejection.stage().as_str(), rejection.reason());
                }
            }
        }

        result
    }

    async fn run(&self, identity: &ClientIdentity, raw: &RawSubmission) -> Result<Admitted, Rejection> {
        transition(identity, AdmissionState::Received);

        let decision = self.rate_limiting.check(identity).await;
        if decision.is_degraded() {
            if let Some(metrics) = &self.metrics {
                metrics.record_backend_error();
            }
        }
        let remaining = match decision {
            RateLimitDecision::Allowed { remaining } => remaining,
            RateLimitDecision::FailedOpen => None,
            RateLimitDecision::Limited { retry_after_secs } => {
                return Err(Rejection::RateLimited { retry_after_secs })
            }
            RateLimitDecision::FailedClosed => return Err(Rejection::RateLimitUnavailable),
        };
        transition(identity, AdmissionState::RateChecked);

        let sanitized = sanitize_submission(raw);
        transition(identity, AdmissionState::Sanitized);

        let payload = self
            .validator
            .validate(&sanitized)
            .map_err(Rejection::Invalid)?;
        transition(identity, AdmissionState::Validated);

        Ok(Admitted { payload, remaining })
    }
}

fn transition(identity: &ClientIdentity, state: AdmissionState) {
    debug!(client = %identity, ?state, "Admission state");
}
