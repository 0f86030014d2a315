// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Markup stripping for untrusted form fields.
//!
//! Every tag and attribute is removed; only text content survives, with any
//! leftover `<`, `>` and `&` entity-escaped. The transform is total and
//! idempotent.

use crate::submission::{RawSubmission, SanitizedSubmission};
use ammonia::Builder;
use std::collections::HashSet;
use std::sync::OnceLock;

fn cleaner() -> &'static Builder<'static> {
    static CLEANER: OnceLock<Builder<'static>> = OnceLock::new();
    CLEANER.get_or_init(|| {
        let mut builder = Builder::empty();
        // Keep the text of <script>/<style> so it is still subject to validation.
        builder.clean_content_tags(HashSet::new());
        builder.strip_comments(true);
        builder
    })
}

/// Strip all markup from a single value and trim it.
pub fn sanitize_text(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }
    cleaner().clean(input).to_string().trim().to_string()
}

/// Sanitize every field of a raw submission.
pub fn sanitize_submission(raw: &RawSubmission) -> SanitizedSubmission {
    let required = |field: &Option<String>| field.as_deref().map(sanitize_text).unwrap_or_default();

    SanitizedSubmission {
        name: required(&raw.name),
        email: required(&raw.email),
        phone: raw
            .phone
            .as_deref()
            .map(sanitize_text)
            .filter(|p| !p.is_empty()),
        subject: required(&raw.subject),
        message: required(&raw.message),
        recaptcha_token: required(&raw.recaptcha_token),
    }
}
