use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use cubehack::{BehaviorConfig, DEFAULT_TICK_RATE, MAX_ENTITIES_PER_UPDATE, PhysicsValues};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error(
        "ai_population + max_clients is {requested}, but one world update holds at most {max} entities"
    )]
    TooManyEntities { requested: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub tick_rate: u32,
    pub max_clients: usize,
    /// AI entities spawned at startup.
    pub ai_population: usize,
    /// Milliseconds a write to one client may block before that client is
    /// dropped.
    pub write_timeout_ms: u64,
    pub physics: PhysicsValues,
    /// Registered in this order; earlier entries win priority ties.
    pub behaviors: Vec<BehaviorConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            max_clients: 32,
            ai_population: 20,
            write_timeout_ms: 2000,
            physics: PhysicsValues::default(),
            behaviors: BehaviorConfig::defaults(),
        }
    }
}

impl ServerConfig {
    /// Parses config from JSON. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 || self.tick_rate > 1000 {
            return Err(ConfigError::Invalid("tick_rate must be between 1 and 1000"));
        }
        if self.write_timeout_ms == 0 {
            return Err(ConfigError::Invalid("write_timeout_ms must be positive"));
        }
        let requested = self.ai_population.saturating_add(self.max_clients);
        if requested > MAX_ENTITIES_PER_UPDATE {
            return Err(ConfigError::TooManyEntities {
                requested,
                max: MAX_ENTITIES_PER_UPDATE,
            });
        }
        if !(self.physics.gravity.is_finite() && self.physics.player_movement_speed.is_finite()) {
            return Err(ConfigError::Invalid("physics values must be finite"));
        }
        Ok(())
    }
}
