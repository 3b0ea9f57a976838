//! Environment and TOML layering for `GazeConfig::load`.
//!
//! Uses figment::Jail for sandboxed cwd and env var manipulation.

use figment::Jail;
use gaze_config::{ConfigError, GazeConfig};

fn load() -> figment::error::Result<GazeConfig> {
    GazeConfig::load().map_err(|e| e.to_string().into())
}

#[test]
fn no_sources_means_skip_mode() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        let config = load()?;
        assert!(!config.database.is_configured());
        assert_eq!(config.server.port, 5000);
        Ok(())
    });
}

#[test]
fn bare_database_url_selects_storage() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.set_env("DATABASE_URL", "libsql://gaze-logs.turso.io");
        jail.set_env("DATABASE_AUTH_TOKEN", "tok");
        let config = load()?;
        assert!(config.database.is_configured());
        assert!(config.database.is_remote());
        assert_eq!(config.database.url, "libsql://gaze-logs.turso.io");
        assert_eq!(config.database.auth_token, "tok");
        Ok(())
    });
}

#[test]
fn bare_port_selects_listen_port() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.set_env("PORT", "8123");
        let config = load()?;
        assert_eq!(config.server.port, 8123);
        Ok(())
    });
}

#[test]
fn prefixed_env_beats_bare_env() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.set_env("DATABASE_URL", "bare.db");
        jail.set_env("GAZE_DATABASE__URL", "prefixed.db");
        jail.set_env("GAZE_DATABASE__MAX_CONNECTIONS", "2");
        let config = load()?;
        assert_eq!(config.database.url, "prefixed.db");
        assert_eq!(config.database.max_connections, 2);
        Ok(())
    });
}

#[test]
fn toml_file_is_loaded_and_env_wins() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.create_file(
            "gazelog.toml",
            r#"
[database]
url = "file:./from-toml.db"
idle_timeout_secs = 5

[server]
port = 7000
static_dir = "client"
trust_forwarded_for = false
"#,
        )?;
        jail.set_env("PORT", "7001");

        let config = load()?;
        assert_eq!(config.database.local_path(), Some("./from-toml.db"));
        assert_eq!(config.database.idle_timeout_secs, 5);
        assert_eq!(config.server.port, 7001);
        assert_eq!(config.server.static_dir, std::path::PathBuf::from("client"));
        assert!(!config.server.trust_forwarded_for);
        Ok(())
    });
}

#[test]
fn invalid_values_are_reported() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.set_env("GAZE_DATABASE__MAX_CONNECTIONS", "0");
        let err = GazeConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }), "got {err}");
        Ok(())
    });
}

#[test]
fn log_filter_variable_is_ignored_by_extraction() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.set_env("GAZE_LOG", "debug");
        load()?;
        Ok(())
    });
}
