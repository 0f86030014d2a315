// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for abuse simulation.

use contact_admission::{ClientIdentity, RawSubmission};

/// Generate a pool of client identities.
pub fn generate_clients(count: usize) -> Vec<ClientIdentity> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = (i >> 16) & 0xFF;
            let b = (i >> 8) & 0xFF;
            let c = i & 0xFF;
            ClientIdentity::new(format!("10.{}.{}.{}", a, b, c))
        })
        .collect()
}

/// A submission that passes every constraint.
pub fn valid_submission(i: usize) -> RawSubmission {
    RawSubmission {
        name: Some("Jane Doe".to_string()),
        email: Some(format!("jane{}@example.com", i)),
        phone: Some(String::new()),
        subject: Some(format!("Quote request {}", i)),
        message: Some("Please send a quote for 10 units.".to_string()),
        recaptcha_token: Some(format!("tok_{}", i)),
    }
}

/// Markup injection vectors, including encoded and malformed variants.
pub fn generate_injection_payloads() -> Vec<&'static str> {
    vec![
        "<script>alert(1)</script>",
        "<img src=x onerror=alert(1)>",
        "<svg/onload=alert(1)>",
        "<a href=\"javascript:alert(1)\">click</a>",
        "<iframe src=\"https://evil.example\"></iframe>",
        "<scr<script>ipt>alert(1)</scr</script>ipt>",
        "&lt;script&gt;alert(1)&lt;/script&gt;",
        "&#60;script&#62;alert(1)&#60;/script&#62;",
        "<<b>b>bold<</b>/b>",
        "<!--<script>-->alert(1)",
        "<style>body{display:none}</style>",
        "<div style=\"background:url(javascript:alert(1))\">x</div>",
        "<math><mi xlink:href=\"javascript:alert(1)\">x</mi></math>",
        "\"><script>alert(document.cookie)</script>",
        "<body onload=alert(1)>",
        "<p unterminated",
    ]
}

/// Email values that must fail validation.
pub fn generate_malformed_emails() -> Vec<&'static str> {
    vec![
        "",
        "   ",
        "not-an-email",
        "@example.com",
        "jane@",
        "jane@localhost",
        "jane@example..com",
        "jane..doe@example.com",
        ".jane@example.com",
        "jane@example.c",
        "jane@@example.com",
        "jane doe@example.com",
        "<jane@example.com>",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_clients() {
        let clients = generate_clients(256);
        assert_eq!(clients.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = clients.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_valid_submissions_differ() {
        assert_ne!(valid_submission(1).email, valid_submission(2).email);
    }
}
