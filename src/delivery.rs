// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Handoff of accepted submissions to the delivery collaborator.

use crate::config::MailConfig;
use crate::error::SinkError;
use crate::submission::ValidatedContactPayload;
use async_trait::async_trait;
use tracing::info;

/// Receives submissions that passed admission.
#[async_trait]
pub trait ContactSink: Send + Sync {
    async fn deliver(&self, payload: &ValidatedContactPayload) -> Result<(), SinkError>;
}

/// Sink that records the handoff in the log.
///
/// Stands in for a mail provider; message contents are not logged.
pub struct LogSink {
    from: String,
    to: String,
}

impl LogSink {
    pub fn new(mail: &MailConfig) -> Self {
        Self {
            from: format!("{} <{}>", mail.from_name, mail.from_address),
            to: mail.to_address.clone(),
        }
    }
}

#[async_trait]
impl ContactSink for LogSink {
    async fn deliver(&self, payload: &ValidatedContactPayload) -> Result<(), SinkError> {
        info!(
            from = %self.from,
            to = %self.to,
            has_phone = payload.phone.is_some(),
            subject_len = payload.subject.chars().count(),
            message_len = payload.message.chars().count(),
            "Contact submission handed off for delivery"
        );
        Ok(())
    }
}
