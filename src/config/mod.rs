//! Configuration for the headless churn simulation

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("`{field}` must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("`{field}` must be a finite number")]
    NotFinite { field: &'static str },
    #[error("`{field}` range is empty: min {min} > max {max}")]
    EmptyRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("`tag_ratio` must lie in [0, 1], got {0}")]
    TagRatio(f64),
}

/// Main configuration for a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub name: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    #[serde(default = "default_dt")]
    pub dt: f32,
    #[serde(default = "default_initial_entities")]
    pub initial_entities: u32,
    #[serde(default)]
    pub spawn_per_tick: u32,
    #[serde(default)]
    pub lifetime: LifetimeConfig,
    #[serde(default)]
    pub speed: SpeedConfig,
    #[serde(default)]
    pub bounds: BoundsConfig,
    #[serde(default = "default_tag_ratio")]
    pub tag_ratio: f64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifetimeConfig {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedConfig {
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundsConfig {
    pub width: f32,
    pub height: f32,
}

fn default_seed() -> u64 {
    42
}

fn default_ticks() -> u64 {
    120
}

fn default_dt() -> f32 {
    1.0 / 60.0
}

fn default_initial_entities() -> u32 {
    1_000
}

fn default_tag_ratio() -> f64 {
    0.1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LifetimeConfig {
    fn default() -> Self {
        Self { min: 30, max: 90 }
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self { min: 5.0, max: 50.0 }
    }
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            width: 320.0,
            height: 180.0,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            seed: default_seed(),
            ticks: default_ticks(),
            dt: default_dt(),
            initial_entities: default_initial_entities(),
            spawn_per_tick: 0,
            lifetime: LifetimeConfig::default(),
            speed: SpeedConfig::default(),
            bounds: BoundsConfig::default(),
            tag_ratio: default_tag_ratio(),
            log_level: default_log_level(),
        }
    }
}

impl SimulationConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: SimulationConfig =
            serde_yaml::from_str(text).context("Failed to parse simulation config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive(self.dt, "dt")?;
        if self.lifetime.min == 0 {
            return Err(ConfigError::NotPositive {
                field: "lifetime.min",
            });
        }
        if self.lifetime.min > self.lifetime.max {
            return Err(ConfigError::EmptyRange {
                field: "lifetime",
                min: self.lifetime.min as f64,
                max: self.lifetime.max as f64,
            });
        }
        finite(self.speed.min, "speed.min")?;
        finite(self.speed.max, "speed.max")?;
        if self.speed.min > self.speed.max {
            return Err(ConfigError::EmptyRange {
                field: "speed",
                min: self.speed.min as f64,
                max: self.speed.max as f64,
            });
        }
        positive(self.bounds.width, "bounds.width")?;
        positive(self.bounds.height, "bounds.height")?;
        if !(0.0..=1.0).contains(&self.tag_ratio) {
            return Err(ConfigError::TagRatio(self.tag_ratio));
        }
        Ok(())
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.unwrap_or(self.ticks)
    }
}

fn finite(value: f32, field: &'static str) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field })
    }
}

/// NaN and infinities fail as `NotFinite` before the sign is checked.
fn positive(value: f32, field: &'static str) -> Result<(), ConfigError> {
    finite(value, field)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field })
    }
}

pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<SimulationConfig> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        SimulationConfig::from_yaml_str(&data)
            .with_context(|| format!("Invalid config {}", path.display()))
    }
}
