//! User configuration.
//!
//! Read once at startup from `$XDG_CONFIG_HOME/stagehand/config.toml`
//! (falling back to `~/.config/stagehand/config.toml`). A missing or broken
//! file never prevents startup; parse errors are printed to stderr and the
//! defaults apply.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Built-in theme name: `"dark"` or `"dracula"`.
    pub theme: String,
    /// How long a leader chord may sit incomplete before it times out.
    pub leader_timeout_ms: u64,
    /// How many commits the log view requests.
    pub log_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { theme: "dark".to_owned(), leader_timeout_ms: 2000, log_limit: 50 }
    }
}

impl Config {
    pub fn leader_timeout(&self) -> Duration {
        Duration::from_millis(self.leader_timeout_ms)
    }

    /// Loads the config file, falling back to defaults on any failure.
    pub fn load() -> Self {
        let path = config_path();
        let raw = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(_) => return Self::default(),
        };
        match toml::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("stagehand: config parse error in {path:?}: {e}");
                Self::default()
            }
        }
    }
}

/// Prefers `$XDG_CONFIG_HOME/stagehand/config.toml`; falls back to
/// `~/.config/stagehand/config.toml` when the env var is absent.
fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("stagehand").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_keys() {
        let config: Config = toml::from_str("theme = \"dracula\"").unwrap();
        assert_eq!(config.theme, "dracula");
        assert_eq!(config.leader_timeout_ms, 2000);
        assert_eq!(config.log_limit, 50);
    }

    #[test]
    fn timeout_converts_to_duration() {
        let config: Config = toml::from_str("leader_timeout_ms = 500").unwrap();
        assert_eq!(config.leader_timeout(), Duration::from_millis(500));
    }
}
