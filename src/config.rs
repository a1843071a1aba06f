//! Configuration loading from TOML.
//!
//! Reads `warchest.toml` and deserializes into strongly-typed structs. The
//! former global feature toggles (stash fighter on creation, seed ledger
//! entry) live here as explicit configuration rather than ambient state.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub rules: RulesConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RulesConfig {
    /// Create the implicit stash fighter with every new roster.
    #[serde(default = "default_true")]
    pub create_stash_fighter: bool,
    /// Write an initial ledger entry on roster creation so propagation is
    /// active from birth. Disable to reproduce legacy pre-ledger rosters.
    #[serde(default = "default_true")]
    pub seed_roster_ledger: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Path of the JSON state file.
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

fn default_true() -> bool {
    true
}

fn default_state_file() -> String {
    "warchest_state.json".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            rules: RulesConfig { create_stash_fighter: true, seed_roster_ledger: true },
            storage: StorageConfig { state_file: default_state_file() },
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load from a TOML file if it exists, otherwise use defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if std::path::Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [rules]
            create_stash_fighter = true
            seed_roster_ledger = false

            [storage]
            state_file = "/tmp/test_state.json"
            "#,
        )
        .unwrap();
        assert!(cfg.rules.create_stash_fighter);
        assert!(!cfg.rules.seed_roster_ledger);
        assert_eq!(cfg.storage.state_file, "/tmp/test_state.json");
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let cfg: AppConfig = toml::from_str("[rules]\n[storage]\n").unwrap();
        assert!(cfg.rules.seed_roster_ledger);
        assert_eq!(cfg.storage.state_file, "warchest_state.json");
    }

    #[test]
    fn test_load_or_default_without_file() {
        let cfg = AppConfig::load_or_default("/tmp/warchest_no_such_config.toml").unwrap();
        assert!(cfg.rules.create_stash_fighter);
    }
}
