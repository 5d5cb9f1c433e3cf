//! Configuration loading from TOML.
//!
//! Reads `config.toml` (or the path in `BETMO_CONFIG`) and deserializes it
//! into strongly-typed structs. Every field has a default, so a partial
//! file or no file at all still yields a runnable configuration.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::storage::{DEFAULT_BALANCE_SUFFIX, DEFAULT_GUESSES_FILE, DEFAULT_WINS_SUFFIX};
use crate::types::Roster;

/// Default config file path.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub participants: Roster,
    pub rules: RulesConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub balance_suffix: String,
    pub wins_suffix: String,
    pub guesses_file: String,
    /// Balance given to a participant whose balance record is missing at startup.
    pub initial_balance: i64,
    pub seed_missing_records: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("betmo/data"),
            balance_suffix: DEFAULT_BALANCE_SUFFIX.to_string(),
            wins_suffix: DEFAULT_WINS_SUFFIX.to_string(),
            guesses_file: DEFAULT_GUESSES_FILE.to_string(),
            initial_balance: 0,
            seed_missing_records: true,
        }
    }
}

/// Game rule switches. Defaults keep the historical behavior.
#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(default)]
pub struct RulesConfig {
    /// Overwrite the guess session with an empty one after each settlement.
    pub close_round_on_settle: bool,
    /// Reject transfers whose `to` is not the sender's counterparty.
    pub strict_transfer_target: bool,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    /// Returns whether the file was found alongside the config.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok((Self::default(), false));
        }
        Ok((Self::load(path)?, true))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let roster = &self.participants;
        if roster.first.trim().is_empty() || roster.second.trim().is_empty() {
            bail!("Participant names must not be empty");
        }
        if roster.first == roster.second {
            bail!("Participant names must differ (both are {:?})", roster.first);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.storage.root, PathBuf::from("betmo/data"));
        assert_eq!(cfg.storage.balance_suffix, "_balance.json");
        assert!(cfg.storage.seed_missing_records);
        assert_eq!(cfg.participants, Roster::default());
        assert!(!cfg.rules.close_round_on_settle);
        assert!(!cfg.rules.strict_transfer_target);
    }

    #[test]
    fn test_partial_override() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [server]
            port = 8080

            [participants]
            first = "Ana"

            [rules]
            strict_transfer_target = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.participants.first, "Ana");
        assert_eq!(cfg.participants.second, "Josh");
        assert!(cfg.rules.strict_transfer_target);
    }

    #[test]
    fn test_rejects_duplicate_participants() {
        let result = AppConfig::from_toml_str(
            r#"
            [participants]
            first = "Josh"
            second = "Josh"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_blank_participant() {
        let result = AppConfig::from_toml_str("[participants]\nfirst = \"  \"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let (cfg, found) = AppConfig::load_or_default("/tmp/betmo_no_such_config_xyz.toml").unwrap();
        assert!(!found);
        assert_eq!(cfg.server.port, 5000);
    }

    #[test]
    fn test_load_config() {
        // Only meaningful when run from the crate root.
        if let Ok(cfg) = AppConfig::load(DEFAULT_CONFIG_FILE) {
            assert_eq!(cfg.participants.first, "Megan");
            assert_eq!(cfg.participants.second, "Josh");
        }
    }
}
