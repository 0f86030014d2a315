// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Abuse patterns for security testing.

/// Abuse pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of submissions to send
    pub total_requests: usize,
    /// Number of unique clients to simulate
    pub unique_clients: usize,
    /// Submission limit per client per window
    pub max_per_client: u32,
    /// Percentage of submissions carrying markup in free-text fields (0.0-1.0)
    pub markup_ratio: f64,
    /// Whether the submissions are otherwise valid
    pub valid_payload: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            unique_clients: 1,
            max_per_client: 5,
            markup_ratio: 0.0,
            valid_payload: true,
        }
    }
}

/// Predefined abuse patterns.
impl AttackConfig {
    /// Single client flood - one sender hammering the form.
    pub fn single_client_flood() -> Self {
        Self {
            total_requests: 200,
            unique_clients: 1,
            ..Default::default()
        }
    }

    /// Distributed flood - many clients, a few submissions each.
    pub fn distributed_flood() -> Self {
        Self {
            total_requests: 500,
            unique_clients: 100,
            ..Default::default()
        }
    }

    /// Markup injection - every submission carries script/HTML payloads.
    pub fn markup_injection() -> Self {
        Self {
            total_requests: 160,
            unique_clients: 40,
            markup_ratio: 1.0,
            ..Default::default()
        }
    }

    /// Junk submissions - garbage bodies from many clients.
    pub fn junk_submissions() -> Self {
        Self {
            total_requests: 100,
            unique_clients: 50,
            valid_payload: false,
            ..Default::default()
        }
    }

    /// Most submissions each client may get through.
    pub fn max_accepted(&self) -> usize {
        let per_client = self.total_requests.div_ceil(self.unique_clients);
        self.unique_clients * per_client.min(self.max_per_client as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_accepted() {
        assert_eq!(AttackConfig::single_client_flood().max_accepted(), 5);
        assert_eq!(AttackConfig::distributed_flood().max_accepted(), 500);
    }
}
