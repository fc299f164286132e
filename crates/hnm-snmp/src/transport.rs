// Shared session configuration.
//
// Both the UDP backend and the in-memory agent are opened from this
// struct, so timeout and retry tuning lives in one place.

use std::time::Duration;

use secrecy::SecretString;

pub const DEFAULT_PORT: u16 = 161;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_RETRIES: u32 = 3;

/// Everything needed to open a session against one agent.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Hostname or IP address of the agent.
    pub host: String,
    pub port: u16,
    /// v2c community string.
    pub community: SecretString,
    /// Per-request receive timeout.
    pub timeout: Duration,
    /// Extra attempts after the first one fails.
    pub retries: u32,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, community: SecretString) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            community,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
        }
    }

    /// `host:port` as used in log lines and errors.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Total number of attempts a single request may take.
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", SecretString::from("public".to_owned()))
    }
}
