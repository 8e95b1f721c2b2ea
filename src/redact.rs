//! Secret redaction for anything that leaves the process as diagnostic text.
//!
//! Two things are scrubbed: the configured API key value itself, and any
//! `Bearer <token>` fragment (upstream error bodies sometimes echo the
//! `Authorization` header back).

use std::sync::OnceLock;

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

use crate::config::strip_bearer;

const MASK: &str = "[REDACTED]";

fn bearer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9._~+/=\-]+").expect("static regex is valid")
    })
}

/// Scrubs secrets out of free-form text.
#[derive(Clone)]
pub struct Redactor {
    secret: SecretString,
}

impl Redactor {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Redact the configured secret and bearer tokens from `text`.
    pub fn redact(&self, text: &str) -> String {
        let raw = strip_bearer(self.secret.expose_secret()).trim();
        let scrubbed = if raw.is_empty() {
            text.to_string()
        } else {
            text.replace(raw, MASK)
        };
        bearer_pattern()
            .replace_all(&scrubbed, format!("Bearer {MASK}").as_str())
            .into_owned()
    }
}
