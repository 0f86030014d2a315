// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Contact form validator.
//!
//! Runs on sanitized input and is a pure function of it:
//! - name: 2-100 chars, letters, whitespace, hyphen, apostrophe
//! - email: address syntax, at most 254 chars
//! - phone (optional): at most 20 chars, digits, whitespace, `+ - ( )`
//! - subject: 3-200 chars
//! - message: 10-5000 chars
//! - recaptchaToken: non-empty
//!
//! Every field is checked and at most one violation is reported per field.

use crate::submission::{SanitizedSubmission, ValidatedContactPayload};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Form field names as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Field {
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "phone")]
    Phone,
    #[serde(rename = "subject")]
    Subject,
    #[serde(rename = "message")]
    Message,
    #[serde(rename = "recaptchaToken")]
    RecaptchaToken,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Subject => "subject",
            Self::Message => "message",
            Self::RecaptchaToken => "recaptchaToken",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable violation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    Required,
    TooShort,
    TooLong,
    InvalidCharacters,
    InvalidFormat,
}

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: Field,
    pub code: ViolationCode,
    pub message: &'static str,
}

impl FieldViolation {
    fn new(field: Field, code: ViolationCode, message: &'static str) -> Self {
        Self { field, code, message }
    }
}

/// All violations found in one submission. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", summary(.0))]
pub struct ValidationErrors(Vec<FieldViolation>);

fn summary(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} ({:?})", v.field, v.code))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationErrors {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    /// Violation for a given field, if any.
    pub fn get(&self, field: Field) -> Option<&FieldViolation> {
        self.0.iter().find(|v| v.field == field)
    }
}

/// Length bounds, counted in characters.
struct Bounds {
    min: usize,
    max: usize,
    too_short: &'static str,
    too_long: &'static str,
}

const NAME: Bounds = Bounds {
    min: 2,
    max: 100,
    too_short: "Name must be at least 2 characters",
    too_long: "Name must be under 100 characters",
};
const SUBJECT: Bounds = Bounds {
    min: 3,
    max: 200,
    too_short: "Subject must be at least 3 characters",
    too_long: "Subject must be under 200 characters",
};
const MESSAGE: Bounds = Bounds {
    min: 10,
    max: 5000,
    too_short: "Message must be at least 10 characters",
    too_long: "Message must be under 5000 characters",
};
const EMAIL_MAX: usize = 254;
const PHONE_MAX: usize = 20;

/// Contact form validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactValidator;

impl ContactValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a sanitized submission into a typed payload.
    pub fn validate(
        &self,
        input: &SanitizedSubmission,
    ) -> Result<ValidatedContactPayload, ValidationErrors> {
        let violations: Vec<FieldViolation> = [
            validate_name(&input.name),
            validate_email(&input.email),
            input.phone.as_deref().and_then(validate_phone),
            check_bounds(Field::Subject, &input.subject, &SUBJECT),
            check_bounds(Field::Message, &input.message, &MESSAGE),
            validate_token(&input.recaptcha_token),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !violations.is_empty() {
            debug!(violations = violations.len(), "Submission failed validation");
            return Err(ValidationErrors(violations));
        }

        Ok(ValidatedContactPayload {
            name: input.name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone().filter(|p| !p.is_empty()),
            subject: input.subject.clone(),
            message: input.message.clone(),
            verification_token: input.recaptcha_token.clone(),
        })
    }
}

fn check_bounds(field: Field, value: &str, bounds: &Bounds) -> Option<FieldViolation> {
    let len = value.chars().count();
    if len < bounds.min {
        Some(FieldViolation::new(field, ViolationCode::TooShort, bounds.too_short))
    } else if len > bounds.max {
        Some(FieldViolation::new(field, ViolationCode::TooLong, bounds.too_long))
    } else {
        None
    }
}

fn validate_name(name: &str) -> Option<FieldViolation> {
    check_bounds(Field::Name, name, &NAME).or_else(|| {
        let allowed = |c: char| c.is_ascii_alphabetic() || c.is_whitespace() || c == '-' || c == '\'';
        (!name.chars().all(allowed)).then(|| {
            FieldViolation::new(
                Field::Name,
                ViolationCode::InvalidCharacters,
                "Name contains invalid characters",
            )
        })
    })
}

fn validate_email(email: &str) -> Option<FieldViolation> {
    if !is_valid_email(email) {
        return Some(FieldViolation::new(
            Field::Email,
            ViolationCode::InvalidFormat,
            "Please enter a valid email address",
        ));
    }
    if email.chars().count() > EMAIL_MAX {
        return Some(FieldViolation::new(
            Field::Email,
            ViolationCode::TooLong,
            "Email must be under 254 characters",
        ));
    }
    None
}

fn validate_phone(phone: &str) -> Option<FieldViolation> {
    if phone.chars().count() > PHONE_MAX {
        return Some(FieldViolation::new(
            Field::Phone,
            ViolationCode::TooLong,
            "Phone number must be under 20 characters",
        ));
    }
    let allowed = |c: char| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '+' | '-' | '(' | ')');
    (!phone.chars().all(allowed)).then(|| {
        FieldViolation::new(
            Field::Phone,
            ViolationCode::InvalidCharacters,
            "Phone contains invalid characters",
        )
    })
}

fn validate_token(token: &str) -> Option<FieldViolation> {
    token.is_empty().then(|| {
        FieldViolation::new(
            Field::RecaptchaToken,
            ViolationCode::Required,
            "reCAPTCHA verification required",
        )
    })
}

/// Check email address syntax.
///
/// Local part: `A-Z a-z 0-9 _ ' + - .`, not starting with `.`, not ending
/// with `.` or `'`. Domain: one or more labels starting alphanumeric and
/// containing alphanumerics or `-`, followed by an alphabetic TLD of at
/// least two letters. No `..` anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.contains("..") {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if domain.contains('@') {
        return false;
    }

    let local_ok = !local.is_empty()
        && !local.starts_with('.')
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '\'' | '+' | '-' | '.'))
        && !local.ends_with(['.', '\'']);
    if !local_ok {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    let Some((tld, hosts)) = labels.split_last() else {
        return false;
    };
    if hosts.is_empty() || tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return false;
    }

    hosts.iter().all(|label| {
        label.starts_with(|c: char| c.is_ascii_alphanumeric())
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_submission() -> SanitizedSubmission {
        SanitizedSubmission {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            phone: None,
            subject: "Quote request".into(),
            message: "Please send a quote for 10 units.".into(),
            recaptcha_token: "tok_abc".into(),
        }
    }

    fn violation(input: SanitizedSubmission, field: Field) -> FieldViolation {
        let errors = ContactValidator::new().validate(&input).unwrap_err();
        errors
            .get(field)
            .cloned()
            .unwrap_or_else(|| panic!("expected violation on {}", field))
    }

    #[test]
    fn test_valid_submission_accepted() {
        let payload = ContactValidator::new().validate(&valid_submission()).unwrap();
        assert_eq!(payload.name, "Jane Doe");
        assert_eq!(payload.phone, None);
        assert_eq!(payload.verification_token, "tok_abc");
    }

    #[test]
    fn test_name_too_short() {
        let v = violation(
            SanitizedSubmission {
                name: "J".into(),
                ..valid_submission()
            },
            Field::Name,
        );
        assert_eq!(v.code, ViolationCode::TooShort);
        assert_eq!(v.message, "Name must be at least 2 characters");
    }

    #[test]
    fn test_name_characters() {
        for ok in ["O'Brien", "Mary-Jane Watson", "Li"] {
            let input = SanitizedSubmission {
                name: ok.into(),
                ..valid_submission()
            };
            assert!(ContactValidator::new().validate(&input).is_ok(), "{ok}");
        }

        let v = violation(
            SanitizedSubmission {
                name: "alert(1)John".into(),
                ..valid_submission()
            },
            Field::Name,
        );
        assert_eq!(v.code, ViolationCode::InvalidCharacters);
    }

    #[test]
    fn test_length_bounds_count_characters() {
        let input = SanitizedSubmission {
            subject: "\u{e9}\u{e9}\u{e9}".into(),
            ..valid_submission()
        };
        assert!(ContactValidator::new().validate(&input).is_ok());

        let v = violation(
            SanitizedSubmission {
                message: "x".repeat(5001),
                ..valid_submission()
            },
            Field::Message,
        );
        assert_eq!(v.code, ViolationCode::TooLong);
    }

    #[test]
    fn test_missing_message_reported_independently() {
        let input = SanitizedSubmission {
            message: String::new(),
            ..valid_submission()
        };
        let errors = ContactValidator::new().validate(&input).unwrap_err();
        assert_eq!(errors.violations().len(), 1);
        assert_eq!(errors.violations()[0].field, Field::Message);
    }

    #[test]
    fn test_violations_accumulate() {
        let input = SanitizedSubmission {
            name: String::new(),
            email: "nope".into(),
            phone: Some("call me".into()),
            subject: "Hi".into(),
            message: "short".into(),
            recaptcha_token: String::new(),
        };
        let errors = ContactValidator::new().validate(&input).unwrap_err();
        let fields: Vec<Field> = errors.violations().iter().map(|v| v.field).collect();
        assert_eq!(
            fields,
            vec![
                Field::Name,
                Field::Email,
                Field::Phone,
                Field::Subject,
                Field::Message,
                Field::RecaptchaToken
            ]
        );
    }

    #[test]
    fn test_phone_rules() {
        let input = SanitizedSubmission {
            phone: Some("+1 (555) 010-9999".into()),
            ..valid_submission()
        };
        assert_eq!(
            ContactValidator::new().validate(&input).unwrap().phone.as_deref(),
            Some("+1 (555) 010-9999")
        );

        let v = violation(
            SanitizedSubmission {
                phone: Some("1".repeat(21)),
                ..valid_submission()
            },
            Field::Phone,
        );
        assert_eq!(v.code, ViolationCode::TooLong);
    }

    #[test]
    fn test_email_syntax() {
        for ok in [
            "jane@example.com",
            "jane.doe+news@mail.example.co.uk",
            "o'connor_1@sub-domain.example.org",
            "x@a-.io",
        ] {
            assert!(is_valid_email(ok), "{ok} should be valid");
        }

        for bad in [
            "",
            "plainaddress",
            "@example.com",
            "jane@",
            "jane@example",
            "jane@example.c",
            "jane@example.c0m",
            ".jane@example.com",
            "jane.@example.com",
            "ja..ne@example.com",
            "jane@@example.com",
            "jane@-example.com",
            "jane doe@example.com",
            "jane@exa_mple.com",
            "jane&amp;@example.com",
        ] {
            assert!(!is_valid_email(bad), "{bad:?} should be invalid");
        }
    }

    #[test]
    fn test_email_too_long() {
        let email = format!("{}@example.com", "a".repeat(250));
        let v = violation(
            SanitizedSubmission {
                email,
                ..valid_submission()
            },
            Field::Email,
        );
        assert_eq!(v.code, ViolationCode::TooLong);
    }
}
