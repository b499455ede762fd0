//! Runtime configuration read from the environment (after `.env` is loaded).

use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_MIN_INPUT_CHARS: usize = 3;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend_url: String,
    pub port: u16,
    pub debounce: Duration,
    pub min_input_chars: usize,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            port: DEFAULT_PORT,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            min_input_chars: DEFAULT_MIN_INPUT_CHARS,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// Optional:
    /// - `BACKEND_URL`: base URL of the suggestion/image backend
    /// - `PORT`: port the page is served on
    /// - `DEBOUNCE_MS`: quiet period before typed input triggers generation
    /// - `MIN_INPUT_CHARS`: shortest typed idea that triggers generation
    /// - `REQUEST_TIMEOUT_SECS`: per-request timeout for backend calls
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let backend_url = lookup("BACKEND_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            backend_url,
            port: parse_or(lookup("PORT"), DEFAULT_PORT),
            debounce: Duration::from_millis(parse_or(lookup("DEBOUNCE_MS"), DEFAULT_DEBOUNCE_MS)),
            min_input_chars: parse_or(lookup("MIN_INPUT_CHARS"), DEFAULT_MIN_INPUT_CHARS),
            request_timeout: Duration::from_secs(parse_or(lookup("REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS)),
        }
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
