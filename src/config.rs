//! Configuration loading for mcp-latitude.
//!
//! Every setting comes from a CLI flag with an environment-variable fallback
//! (a `.env` file in the working directory is loaded first, if present):
//!
//! | Flag           | Env var              | Default                   |
//! |----------------|----------------------|---------------------------|
//! | `--api-key`    | `LATITUDE_API_KEY`   | required                  |
//! | `--base-url`   | `LATITUDE_BASE_URL`  | `https://api.latitude.sh` |
//! | `--timeout-ms` | `LATITUDE_TIMEOUT`   | `10000` (1000..=60000)    |
//! | `--log-level`  | `LATITUDE_LOG_LEVEL` | `info`                    |
//!
//! The resolved [`Config`] is built once in `main` and never re-validated.
//! Any problem aborts startup before the first JSON-RPC line is read.

use std::time::Duration;

use clap::Parser;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.latitude.sh";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const MIN_TIMEOUT_MS: u64 = 1_000;
pub const MAX_TIMEOUT_MS: u64 = 60_000;

/// Hosts the base URL may point at: the apex domain or any subdomain of it.
const PROVIDER_DOMAIN: &str = "latitude.sh";

/// CLI arguments parsed by `clap`.
#[derive(Parser, Debug)]
#[command(
    name = "mcp-latitude",
    version,
    about = "MCP server for the Latitude.sh bare-metal API"
)]
pub struct Cli {
    /// Latitude.sh API key (a leading "Bearer " is accepted).
    #[arg(long, env = "LATITUDE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// API base URL. Must be HTTPS on the latitude.sh domain.
    #[arg(long, env = "LATITUDE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in milliseconds.
    #[arg(long, env = "LATITUDE_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Log filter used when RUST_LOG is unset. Logs go to stderr.
    #[arg(long, env = "LATITUDE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Startup configuration problems.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("LATITUDE_API_KEY is not set")]
    MissingApiKey,
    #[error("LATITUDE_API_KEY is empty")]
    EmptyApiKey,
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("timeout must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS} ms, got {0}")]
    TimeoutOutOfRange(u64),
}

/// Validated, immutable configuration.
#[derive(Clone)]
pub struct Config {
    pub(crate) api_key: SecretString,
    pub(crate) base_url: String,
    pub(crate) timeout_ms: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl Config {
    /// Validate CLI/env input into a [`Config`].
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let api_key = match cli.api_key.as_deref() {
            None => return Err(ConfigError::MissingApiKey),
            Some(k) if k.trim().is_empty() => return Err(ConfigError::EmptyApiKey),
            Some(k) => k.trim().to_string(),
        };

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url: validate_base_url(&cli.base_url)?,
            timeout_ms: validate_timeout(cli.timeout_ms)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// Value for the `Authorization` header. A key supplied with its own
    /// `Bearer ` prefix (any case) is not prefixed twice.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", strip_bearer(self.api_key.expose_secret()))
    }
}

/// The key without a leading `Bearer ` scheme, matched case-insensitively.
pub(crate) fn strip_bearer(key: &str) -> &str {
    match key.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => key[7..].trim_start(),
        _ => key,
    }
}

/// `raw` with any `user:password@` userinfo removed, for error messages.
fn without_userinfo(raw: &str) -> String {
    let raw = raw.trim();
    let Some(scheme_end) = raw.find("://").map(|i| i + 3) else {
        return raw.to_string();
    };
    let rest = &raw[scheme_end..];
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}{}", &raw[..scheme_end], &rest[at + 1..]),
        None => raw.to_string(),
    }
}

fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
        url: without_userinfo(raw),
        reason: reason.to_string(),
    };

    let parsed = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if parsed.scheme() != "https" {
        return Err(invalid("scheme must be https"));
    }
    let host = parsed.host_str().ok_or_else(|| invalid("missing host"))?;
    let host = host.to_ascii_lowercase();
    let in_domain =
        host == PROVIDER_DOMAIN || host.ends_with(&format!(".{PROVIDER_DOMAIN}"));
    if !in_domain {
        return Err(invalid("host must be latitude.sh or one of its subdomains"));
    }
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(invalid("credentials in URL are not allowed"));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

fn validate_timeout(ms: u64) -> Result<u64, ConfigError> {
    if (MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&ms) {
        Ok(ms)
    } else {
        Err(ConfigError::TimeoutOutOfRange(ms))
    }
}

#[cfg(test)]
impl Config {
    /// Test-only constructor that skips base URL validation so requests can
    /// target a local stub server.
    pub(crate) fn for_test(base_url: &str, api_key: &str, timeout_ms: u64) -> Self {
        Self {
            api_key: SecretString::from(api_key.to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms,
        }
    }
}
