// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Form Admission
//!
//! Every contact form submission passes three gates before it is accepted:
//!
//! - Per-client sliding window rate limiting (5 per hour default)
//! - Markup stripping on every text field
//! - Field validation (name, email, optional phone, subject, message,
//!   verification token)
//!
//! Rejections carry the stage, a reason code and, for rate limiting, a
//! retry hint.

pub mod config;
pub mod delivery;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod limiter;
pub mod metrics;
pub mod pipeline;
pub mod sanitize;
pub mod submission;
pub mod validator;

pub use config::Config;
pub use identity::ClientIdentity;
pub use limiter::{RateLimitDecision, RateLimiter, RateLimiting};
pub use pipeline::{AdmissionPipeline, Admitted, Rejection, Stage};
pub use submission::{RawSubmission, SanitizedSubmission, ValidatedContactPayload};
pub use validator::{ContactValidator, ValidationErrors};
