//! Client Configuration
//!
//! Everything a host application tunes about a session. Every field has a
//! default, so a config file only needs the keys it changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::vec2::Vec2;
use crate::game::actor::DEFAULT_SPAWN;
use crate::game::clock::StepMode;
use crate::game::tick::TickConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for this struct.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong
        reason: &'static str,
    },
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Map file (JSON 2D array of tile codes)
    pub map_path: PathBuf,
    /// WebSocket endpoint
    pub endpoint: String,
    /// Minimum gap between position reports (ms)
    pub position_report_interval_ms: u64,
    /// Minimum gap between accepted interact presses (ms)
    pub interact_cooldown_ms: u64,
    /// Frame driver rate (Hz)
    pub frame_rate: u32,
    /// How frame time becomes simulation steps
    pub step_mode: StepMode,
    /// Where the local player appears after login
    pub spawn: Vec2,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            map_path: PathBuf::from("map.json"),
            endpoint: "ws://127.0.0.1:8080".to_string(),
            position_report_interval_ms: 50,
            interact_cooldown_ms: 300,
            frame_rate: 60,
            step_mode: StepMode::default(),
            spawn: DEFAULT_SPAWN,
        }
    }
}

impl ClientConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_rate == 0 {
            return Err(ConfigError::Invalid { field: "frame_rate", reason: "must be positive" });
        }
        match self.step_mode {
            StepMode::Variable { max_dt } if !max_dt.is_finite() || max_dt <= 0.0 => Err(ConfigError::Invalid {
                field: "step_mode.max_dt",
                reason: "must be positive",
            }),
            StepMode::Fixed { step, .. } if !step.is_finite() || step <= 0.0 => Err(ConfigError::Invalid {
                field: "step_mode.step",
                reason: "must be positive",
            }),
            StepMode::Fixed { max_steps: 0, .. } => Err(ConfigError::Invalid {
                field: "step_mode.max_steps",
                reason: "must be at least 1",
            }),
            _ => Ok(()),
        }
    }

    /// Position report interval.
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.position_report_interval_ms)
    }

    /// Frame period for the async driver.
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate.max(1) as f64)
    }

    /// Per-tick simulation settings.
    pub fn tick_config(&self) -> TickConfig {
        TickConfig {
            interact_cooldown: Duration::from_millis(self.interact_cooldown_ms).as_secs_f64(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.report_interval(), Duration::from_millis(50));
        assert!((config.tick_config().interact_cooldown - 0.3).abs() < 1e-12);
        assert_eq!(config.spawn, Vec2::new(100.0, 100.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = ClientConfig::from_json(
            r#"{"endpoint":"ws://example:9000","step_mode":{"mode":"fixed","step":0.02,"max_steps":4}}"#,
        )
        .unwrap();
        assert_eq!(config.endpoint, "ws://example:9000");
        assert_eq!(config.step_mode, StepMode::Fixed { step: 0.02, max_steps: 4 });
        assert_eq!(config.interact_cooldown_ms, 300);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            ClientConfig::from_json(r#"{"frame_rate":0}"#),
            Err(ConfigError::Invalid { field: "frame_rate", .. })
        ));
        assert!(matches!(
            ClientConfig::from_json(r#"{"step_mode":{"mode":"fixed","step":0.0,"max_steps":4}}"#),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(ClientConfig::from_json("[1]"), Err(ConfigError::Parse(_))));
        assert!(matches!(ClientConfig::load("/nonexistent/config.json"), Err(ConfigError::Io { .. })));
    }
}
