//! Storage backend configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default upper bound on pooled connections.
const fn default_max_connections() -> usize {
    5
}

/// Default idle eviction window, in seconds.
const fn default_idle_timeout_secs() -> u64 {
    30
}

/// Default wait for a free pooled connection, in seconds.
const fn default_acquire_timeout_secs() -> u64 {
    10
}

/// Default deadline for one schema-ensure + insert sequence, in seconds.
const fn default_statement_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Connection descriptor.
    ///
    /// `libsql://`, `https://`, `http://`, `ws://` or `wss://` selects a
    /// remote database; any other value is a local file path. Empty disables
    /// persistence entirely.
    #[serde(default)]
    pub url: String,

    /// Auth token for remote databases.
    #[serde(default)]
    pub auth_token: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            auth_token: String::new(),
            max_connections: default_max_connections(),
            idle_timeout_secs: default_idle_timeout_secs(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            statement_timeout_secs: default_statement_timeout_secs(),
        }
    }
}

impl DatabaseConfig {
    /// Whether a storage backend is configured at all.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Whether the descriptor points at a remote server.
    pub fn is_remote(&self) -> bool {
        const REMOTE_SCHEMES: [&str; 5] = ["libsql://", "https://", "http://", "ws://", "wss://"];
        let url = self.url.trim();
        REMOTE_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
    }

    /// Local database path, with any `file:` prefix removed.
    ///
    /// Returns `None` for remote or unconfigured descriptors.
    pub fn local_path(&self) -> Option<&str> {
        if !self.is_configured() || self.is_remote() {
            return None;
        }
        let url = self.url.trim();
        Some(url.strip_prefix("file:").unwrap_or(url))
    }

    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub const fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub const fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = DatabaseConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.idle_timeout(), Duration::from_secs(30));
        assert_eq!(config.acquire_timeout(), Duration::from_secs(10));
        assert_eq!(config.statement_timeout(), Duration::from_secs(15));
        assert_eq!(config.local_path(), None);
    }

    #[test]
    fn whitespace_url_is_not_configured() {
        let config = DatabaseConfig {
            url: "   ".into(),
            ..Default::default()
        };
        assert!(!config.is_configured());
    }

    #[test]
    fn remote_schemes_detected() {
        for url in [
            "libsql://gaze-logs.turso.io",
            "https://db.example.org",
            "http://127.0.0.1:8080",
            "wss://db.example.org",
        ] {
            let config = DatabaseConfig {
                url: url.into(),
                ..Default::default()
            };
            assert!(config.is_remote(), "{url} should be remote");
            assert_eq!(config.local_path(), None);
        }
    }

    #[test]
    fn local_path_strips_file_prefix() {
        let config = DatabaseConfig {
            url: "file:./data/gaze.db".into(),
            ..Default::default()
        };
        assert!(!config.is_remote());
        assert_eq!(config.local_path(), Some("./data/gaze.db"));

        let bare = DatabaseConfig {
            url: "gaze.db".into(),
            ..Default::default()
        };
        assert_eq!(bare.local_path(), Some("gaze.db"));
    }
}
