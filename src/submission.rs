// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact form payloads at each stage of admission.

use serde::{Deserialize, Serialize};

/// Untrusted form body as received from the client.
///
/// Every field may be missing; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "recaptchaToken")]
    pub recaptcha_token: Option<String>,
}

/// Submission with markup stripped and whitespace trimmed.
///
/// Required fields are always present (possibly empty); `phone` is `None`
/// rather than empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizedSubmission {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub recaptcha_token: String,
}

/// A submission that passed every constraint. The only shape handed to
/// delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedContactPayload {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    #[serde(rename = "verificationToken")]
    pub verification_token: String,
}
