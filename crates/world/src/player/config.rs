use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Experience awarded by one-time events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpConfig {
    pub initial_xp: u32,
    pub explore_xp: u32,
    pub chest_xp: u32,
}

impl Default for XpConfig {
    fn default() -> Self {
        Self {
            initial_xp: 0,
            explore_xp: 1,
            chest_xp: 5,
        }
    }
}

/// Game balance constants handed to a new player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub initial_coins: u32,
    pub initial_health: u32,
    pub initial_max_health: u32,
    pub max_possible_health: u32,
    pub lava_health_damage: u32,
    pub chest_coins_maximum: u32,
    pub chest_reward_factor: u32,
    pub chest_health_damage_maximum: u32,
    pub ship_cost: u32,
    pub xp: XpConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_coins: 20,
            initial_health: 30,
            initial_max_health: 30,
            max_possible_health: 100,
            lava_health_damage: 5,
            chest_coins_maximum: 100,
            chest_reward_factor: 50,
            chest_health_damage_maximum: 5,
            ship_cost: 100,
            xp: XpConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path} at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GameConfig {
    pub fn with_initial_coins(mut self, coins: u32) -> Self {
        self.initial_coins = coins;
        self
    }

    pub fn with_initial_health(mut self, health: u32) -> Self {
        self.initial_health = health;
        self
    }

    pub fn with_initial_max_health(mut self, max_health: u32) -> Self {
        self.initial_max_health = max_health;
        self
    }

    pub fn with_max_possible_health(mut self, max_possible_health: u32) -> Self {
        self.max_possible_health = max_possible_health;
        self
    }

    pub fn with_lava_health_damage(mut self, damage: u32) -> Self {
        self.lava_health_damage = damage;
        self
    }

    pub fn with_ship_cost(mut self, cost: u32) -> Self {
        self.ship_cost = cost;
        self
    }

    pub fn with_xp(mut self, xp: XpConfig) -> Self {
        self.xp = xp;
        self
    }

    /// Reads a JSON config. Missing fields keep their defaults and unknown
    /// fields are ignored.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|(json_path, source)| ConfigError::Parse {
            path: path.to_path_buf(),
            json_path,
            source,
        })
    }

    fn from_json(raw: &str) -> Result<Self, (String, serde_json::Error)> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let json_path = error.path().to_string();
            (json_path, error.into_inner())
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn defaults_match_the_stock_game() {
        let config = GameConfig::default();
        assert_eq!(config.initial_coins, 20);
        assert_eq!(config.initial_health, 30);
        assert_eq!(config.initial_max_health, 30);
        assert_eq!(config.max_possible_health, 100);
        assert_eq!(config.lava_health_damage, 5);
        assert_eq!(config.ship_cost, 100);
        assert_eq!(config.xp.chest_xp, 5);
    }

    #[test]
    fn load_merges_partial_json_over_defaults() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{"initial_coins": 7, "xp": {"explore_xp": 3}, "theme": "dark"}"#,
        )
        .expect("write");

        let config = GameConfig::load(&path).expect("load");
        assert_eq!(config.initial_coins, 7);
        assert_eq!(config.xp.explore_xp, 3);
        assert_eq!(config.xp.chest_xp, 5);
        assert_eq!(config.initial_health, 30);
    }

    #[test]
    fn load_reports_json_path_of_bad_value() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"xp": {"chest_xp": -1}}"#).expect("write");

        let err = GameConfig::load(&path).expect_err("negative xp");
        match err {
            ConfigError::Parse { json_path, .. } => assert_eq!(json_path, "xp.chest_xp"),
            other => panic!("unexpected error: {other}"),
        }

        let missing = temp.path().join("missing.json");
        assert!(matches!(
            GameConfig::load(&missing),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn builders_override_fields() {
        let config = GameConfig::default()
            .with_initial_coins(1)
            .with_ship_cost(0)
            .with_max_possible_health(40);
        assert_eq!(config.initial_coins, 1);
        assert_eq!(config.ship_cost, 0);
        assert_eq!(config.max_possible_health, 40);
    }
}
