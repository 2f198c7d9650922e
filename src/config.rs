//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`CRATER_SECTION__KEY`)

use craterkit_physics::{BouncingConfig, StickyConfig, WalkingConfig};
use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Body tuning
    #[serde(default)]
    pub physics: PhysicsConfig,
    /// Step loop settings
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Terrain source
    #[serde(default)]
    pub terrain: TerrainConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`CRATER_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // CRATER_PHYSICS__WALKING__GRAVITY=30 -> physics.walking.gravity = 30.0
        figment = figment.merge(Env::prefixed("CRATER_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Per-body-type tuning, passed straight to the body constructors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub walking: WalkingConfig,
    pub bouncing: BouncingConfig,
    pub sticky: StickyConfig,
}

/// Simulation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Steps per simulated second
    pub tick_rate: f32,
    /// Simulated time to run for
    pub duration_seconds: f32,
    /// Write the final snapshot here when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<String>,
}

impl SimulationConfig {
    /// Length of one step in seconds
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1.0)
    }

    /// Number of steps covering `duration_seconds`
    pub fn steps(&self) -> usize {
        (self.duration_seconds.max(0.0) * self.tick_rate.max(1.0)).round() as usize
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30.0,
            duration_seconds: 5.0,
            snapshot_path: None,
        }
    }
}

/// Terrain source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Width of the generated terrain when no image is given
    pub width: usize,
    /// Height of the generated terrain when no image is given
    pub height: usize,
    /// PNG whose opaque pixels become solid ground
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            image: None,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}
