// src/config.rs - Host configuration loaded from TOML

use crate::axis::{AxisConfig, AxisConfigError, AxisKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Axis(#[from] AxisConfigError),
    #[error("update_rate_hz must be a positive integer")]
    InvalidUpdateRate,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    /// Tick frequency of the engine, in Hz.
    #[serde(default = "default_update_rate")]
    pub update_rate_hz: u32,
    /// Axis used by movements that omit their axis.
    #[serde(default)]
    pub default_axis: Option<String>,
    #[serde(default)]
    pub axes: HashMap<String, AxisSpec>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            update_rate_hz: default_update_rate(),
            default_axis: None,
            axes: HashMap::new(),
        }
    }
}

/// One `[axes.<name>]` table entry; the table key is the axis name.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AxisSpec {
    pub kind: AxisKind,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default = "default_min")]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
}

fn default_update_rate() -> u32 {
    50
}

fn default_min() -> f64 {
    0.0
}

fn default_max() -> f64 {
    1.0
}

impl HostConfig {
    /// Axis registrations in name order, so collisions surface
    /// deterministically.
    pub fn axis_configs(&self) -> Vec<AxisConfig> {
        let mut names: Vec<&String> = self.axes.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| {
                let spec = &self.axes[name];
                AxisConfig {
                    name: name.clone(),
                    alias: spec.alias.clone(),
                    kind: spec.kind,
                    min: spec.min,
                    max: spec.max,
                }
            })
            .collect()
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<HostConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    let config: HostConfig = toml::from_str(&raw)?;
    if config.update_rate_hz == 0 {
        return Err(ConfigError::InvalidUpdateRate);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_full_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
update_rate_hz = 100
default_axis = "stroke"

[axes.stroke]
kind = "linear"
alias = "L0"

[axes.valve]
kind = "boolean"
"#
        )
        .unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.update_rate_hz, 100);
        assert_eq!(config.default_axis.as_deref(), Some("stroke"));
        let axes = config.axis_configs();
        assert_eq!(axes.len(), 2);
        assert_eq!(axes[0].name, "stroke");
        assert_eq!(axes[0].alias.as_deref(), Some("L0"));
        assert_eq!(axes[1].kind, AxisKind::Boolean);
    }

    #[test]
    fn update_rate_defaults_to_50() {
        let config: HostConfig = toml::from_str("").unwrap();
        assert_eq!(config.update_rate_hz, 50);
    }

    #[test]
    fn zero_update_rate_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "update_rate_hz = 0").unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::InvalidUpdateRate)
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            load_config("/nonexistent/axes.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
