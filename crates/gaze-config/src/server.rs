//! HTTP listener and static asset configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_port() -> u16 {
    5000
}

/// Dedicated client directory, kept apart from the config and `.env` files.
fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

/// Cache lifetime for static assets, in seconds.
const fn default_static_max_age_secs() -> u64 {
    3600
}

/// Request body ceiling. Gaze traces are large.
const fn default_body_limit_bytes() -> usize {
    20 * 1024 * 1024
}

const fn default_trust_forwarded_for() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Root directory for the experiment client's static files.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    #[serde(default = "default_static_max_age_secs")]
    pub static_max_age_secs: u64,

    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,

    /// Take the client IP from the first `X-Forwarded-For` entry.
    ///
    /// Only sound when exactly one trusted proxy sits in front.
    #[serde(default = "default_trust_forwarded_for")]
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            static_max_age_secs: default_static_max_age_secs(),
            body_limit_bytes: default_body_limit_bytes(),
            trust_forwarded_for: default_trust_forwarded_for(),
        }
    }
}

impl ServerConfig {
    pub const fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:5000");
        assert_eq!(config.static_dir, PathBuf::from("public"));
        assert_eq!(config.static_max_age_secs, 3600);
        assert_eq!(config.body_limit_bytes, 20 * 1024 * 1024);
        assert!(config.trust_forwarded_for);
    }
}
