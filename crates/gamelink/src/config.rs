//! Socket configuration.

use std::time::Duration;

use tracing::warn;

const CLOSE_GRACE_ENV: &str = "GAMELINK_CLOSE_GRACE_MS";
const RESPONSE_TIMEOUT_ENV: &str = "GAMELINK_RESPONSE_TIMEOUT_MS";
const TLS_TIMEOUT_ENV: &str = "GAMELINK_TLS_TIMEOUT_MS";

/// Tunables for a [`Socket`](crate::Socket).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketConfig {
    /// How long `close` waits for the server to acknowledge the close
    /// handshake before dropping the connection.
    pub close_grace: Duration,

    /// How long a setup call waits for the server's answer. `None` waits
    /// until the connection closes.
    pub response_timeout: Option<Duration>,

    /// How long TLS detection may take when the URL has no scheme.
    pub tls_timeout: Duration,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            close_grace: Duration::from_secs(5),
            response_timeout: None,
            tls_timeout: Duration::from_secs(5),
        }
    }
}

impl SocketConfig {
    /// Defaults, overridden by `GAMELINK_CLOSE_GRACE_MS`,
    /// `GAMELINK_RESPONSE_TIMEOUT_MS` (`0` disables the timeout) and
    /// `GAMELINK_TLS_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(ms) = millis(&lookup, CLOSE_GRACE_ENV) {
            config.close_grace = Duration::from_millis(ms);
        }
        if let Some(ms) = millis(&lookup, RESPONSE_TIMEOUT_ENV) {
            config.response_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(ms) = millis(&lookup, TLS_TIMEOUT_ENV) {
            config.tls_timeout = Duration::from_millis(ms);
        }

        config
    }

    pub fn with_close_grace(mut self, grace: Duration) -> Self {
        self.close_grace = grace;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_tls_timeout(mut self, timeout: Duration) -> Self {
        self.tls_timeout = timeout;
        self
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(ms) => Some(ms),
        Err(e) => {
            warn!(key, value = raw, error = %e, "ignoring invalid duration");
            None
        }
    }
}
