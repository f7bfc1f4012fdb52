//! Server configuration, read from environment variables with defaults.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SESSION_DIR: &str = "sessions";
pub const DEFAULT_INACTIVITY_HOURS: u64 = 12;

/// Settings for the web binary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    /// `HOST`
    pub host: String,
    /// `PORT`
    pub port: u16,
    /// `SESSION_DIR`: where saved snapshots are written.
    pub session_dir: PathBuf,
    /// `INACTIVITY_HOURS`: sessions untouched this long are dropped from memory.
    pub inactivity_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            session_dir: PathBuf::from(DEFAULT_SESSION_DIR),
            inactivity_timeout: Duration::from_secs(DEFAULT_INACTIVITY_HOURS * 3600),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset and bad numbers fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();
        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => log::warn!("Ignoring invalid PORT {:?}, using {}", port, DEFAULT_PORT),
            }
        }
        if let Some(dir) = get("SESSION_DIR") {
            config.session_dir = PathBuf::from(dir);
        }
        if let Some(hours) = get("INACTIVITY_HOURS") {
            match hours.parse::<u64>() {
                Ok(hours) => config.inactivity_timeout = Duration::from_secs(hours * 3600),
                Err(_) => log::warn!(
                    "Ignoring invalid INACTIVITY_HOURS {:?}, using {}",
                    hours,
                    DEFAULT_INACTIVITY_HOURS
                ),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(ServerConfig::from_lookup(lookup(&[])), ServerConfig::default());
    }

    #[test]
    fn reads_values_and_ignores_garbage() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOST", " 127.0.0.1 "),
            ("PORT", "not-a-port"),
            ("SESSION_DIR", "/tmp/swiss"),
            ("INACTIVITY_HOURS", "2"),
        ]));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.session_dir, PathBuf::from("/tmp/swiss"));
        assert_eq!(config.inactivity_timeout, Duration::from_secs(2 * 3600));
    }
}
