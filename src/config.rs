/// Match session settings, loaded from an optional JSON file
use crate::balloon::moves::WireFormat;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("capacity bounds must be finite with min <= max (got {min}..={max})")]
    CapacityRange { min: f32, max: f32 },
    #[error("a match needs at least one participant")]
    NoParticipants,
    #[error("{field} must be a finite, non-negative number")]
    NotFinite { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub min_capacity: f32,
    pub max_capacity: f32,
    pub participant_count: usize,
    pub wire_format: WireFormat,
    /// Forces a pump of `timeout_pump` when the local turn runs this long.
    pub turn_timeout_secs: Option<u64>,
    pub timeout_pump: f32,
    pub gauge_speed: f32,
    pub gauge_max: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_capacity: 100.0,
            max_capacity: 120.0,
            participant_count: 2,
            wire_format: WireFormat::Postcard,
            turn_timeout_secs: None,
            timeout_pump: 0.0,
            gauge_speed: 3.0,
            gauge_max: 30.0,
        }
    }
}

impl MatchConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = (self.min_capacity, self.max_capacity);
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ConfigError::CapacityRange { min, max });
        }
        if self.participant_count == 0 {
            return Err(ConfigError::NoParticipants);
        }
        let non_negative = [
            ("timeout_pump", self.timeout_pump),
            ("gauge_speed", self.gauge_speed),
            ("gauge_max", self.gauge_max),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NotFinite { field });
            }
        }
        Ok(())
    }

    pub fn turn_timeout(&self) -> Option<Duration> {
        self.turn_timeout_secs.map(Duration::from_secs)
    }
}
