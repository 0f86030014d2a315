// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for admission outcomes.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Admission metrics in a dedicated registry.
pub struct AdmissionMetrics {
    registry: Registry,
    submissions: IntCounterVec,
    backend_errors: IntCounter,
}

impl AdmissionMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new(
                "contact_submissions_total",
                "Contact form submissions by admission outcome",
            ),
            &["outcome", "stage", "reason"],
        )?;
        let backend_errors = IntCounter::new(
            "contact_rate_limit_backend_errors_total",
            "Rate limit backend calls that failed",
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(backend_errors.clone()))?;

        Ok(Self {
            registry,
            submissions,
            backend_errors,
        })
    }

    pub fn record_accepted(&self) {
        self.submissions
            .with_label_values(&["accepted", "", ""])
            .inc();
    }

    pub fn record_rejected(&self, stage: &str, reason: &str) {
        self.submissions
            .with_label_values(&["rejected", stage, reason])
            .inc();
    }

    pub fn record_backend_error(&self) {
        self.backend_errors.inc();
    }

    pub fn accepted(&self) -> u64 {
        self.submissions
            .with_label_values(&["accepted", "", ""])
            .get()
    }

    pub fn rejected(&self, stage: &str, reason: &str) -> u64 {
        self.submissions
            .with_label_values(&["rejected", stage, reason])
            .get()
    }

    pub fn backend_errors(&self) -> u64 {
        self.backend_errors.get()
    }

    /// Render the registry in Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
