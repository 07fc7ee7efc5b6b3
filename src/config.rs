//! Configuration management for Prensa Server

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub transform: TransformConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Settings for the transformation engine.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    /// Root directory for per-request workspaces. Passed explicitly into
    /// every workspace; nothing reads a process-wide temp constant.
    pub temp_root: PathBuf,
    /// Timeout for one backend version probe.
    pub probe_timeout_secs: u64,
    /// Timeout for one conversion candidate attempt.
    pub attempt_timeout_secs: u64,
    /// Upper bound for uploaded request bodies.
    pub max_upload_bytes: usize,
}

impl TransformConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            transform: TransformConfig {
                temp_root: env::temp_dir().join("prensa"),
                probe_timeout_secs: 5,
                attempt_timeout_secs: 120,
                max_upload_bytes: 100 * 1024 * 1024,
            },
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env_parse("SERVER_PORT", defaults.server.port),
            },
            transform: TransformConfig {
                temp_root: env::var("PRENSA_TEMP_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.transform.temp_root),
                probe_timeout_secs: env_parse(
                    "PRENSA_PROBE_TIMEOUT_SECS",
                    defaults.transform.probe_timeout_secs,
                ),
                attempt_timeout_secs: env_parse(
                    "PRENSA_ATTEMPT_TIMEOUT_SECS",
                    defaults.transform.attempt_timeout_secs,
                ),
                max_upload_bytes: env_parse(
                    "PRENSA_MAX_UPLOAD_BYTES",
                    defaults.transform.max_upload_bytes,
                ),
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert!(config.transform.attempt_timeout() > config.transform.probe_timeout());
    }

    #[test]
    fn timeouts_convert_to_durations() {
        let config = Config::default();
        assert_eq!(
            config.transform.probe_timeout(),
            Duration::from_secs(config.transform.probe_timeout_secs)
        );
    }
}
