//! Environment-driven client configuration.

use std::time::Duration;

use stockdesk_billing::DEFAULT_COOLDOWN;

use crate::reporting::Currency;

pub const DEFAULT_API_URL: &str = "http://localhost:5001/api";
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the backend, without a trailing slash.
    pub api_url: String,
    pub token: Option<String>,
    pub scan_cooldown: Duration,
    /// Bound of the billing session's request queue.
    pub queue_capacity: usize,
    pub currency: Currency,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            scan_cooldown: DEFAULT_COOLDOWN,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            currency: Currency::default(),
        }
    }
}

impl ClientConfig {
    /// Read `STOCKDESK_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_url = lookup("STOCKDESK_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_url);

        let token = lookup("STOCKDESK_TOKEN").filter(|t| !t.trim().is_empty());

        let cooldown_ms = parse_or(
            &lookup,
            "STOCKDESK_SCAN_COOLDOWN_MS",
            defaults.scan_cooldown.as_millis() as u64,
        );
        let scan_cooldown = Duration::from_millis(cooldown_ms);

        let mut queue_capacity = parse_or(&lookup, "STOCKDESK_QUEUE_CAPACITY", defaults.queue_capacity);
        if queue_capacity == 0 {
            tracing::warn!("STOCKDESK_QUEUE_CAPACITY must be positive; using default");
            queue_capacity = DEFAULT_QUEUE_CAPACITY;
        }

        let currency = parse_or(&lookup, "STOCKDESK_CURRENCY", defaults.currency);

        Self {
            api_url,
            token,
            scan_cooldown,
            queue_capacity,
            currency,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: core::str::FromStr,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting; using default");
            default
        }
    }
}
