// Engine configuration - Loaded from RON, validated before the engine is built

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

pub const TEMPO_MIN: f64 = 20.0;
pub const TEMPO_MAX: f64 = 999.0;
pub const STEPS_PER_BEAT_MAX: u32 = 16;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f32),

    #[error("Invalid tempo: {0} bpm (expected 20..=999)")]
    InvalidTempo(f64),

    #[error("Invalid steps per beat: {0}")]
    InvalidStepsPerBeat(u32),

    #[error("Invalid gate voltage: {0}")]
    InvalidGateVoltage(f32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Parse(String),
}

/// Settings fixed for the lifetime of an engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Tempo of the internal clock
    pub tempo_bpm: f64,
    /// Internal clock edges per beat
    pub steps_per_beat: u32,
    /// Seed of the engine's random source, entropy when absent
    pub seed: Option<u64>,
    /// Level of a high gate output
    pub gate_voltage: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            tempo_bpm: 120.0,
            steps_per_beat: 4,
            seed: None,
            gate_voltage: crate::sequencer::GATE_HIGH,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if !(TEMPO_MIN..=TEMPO_MAX).contains(&self.tempo_bpm) {
            return Err(ConfigError::InvalidTempo(self.tempo_bpm));
        }
        if self.steps_per_beat == 0 || self.steps_per_beat > STEPS_PER_BEAT_MAX {
            return Err(ConfigError::InvalidStepsPerBeat(self.steps_per_beat));
        }
        if !self.gate_voltage.is_finite() || self.gate_voltage <= 0.0 || self.gate_voltage > 12.0 {
            return Err(ConfigError::InvalidGateVoltage(self.gate_voltage));
        }
        Ok(())
    }

    /// Parse and validate a RON document. Missing fields take their defaults.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&text)?;
        info!("Loaded engine config from {:?}", path);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        info!("Saved engine config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = EngineConfig::from_ron("(tempo_bpm: 90.0, seed: Some(42))").unwrap();
        assert_eq!(config.tempo_bpm, 90.0);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.sample_rate, 48000.0);
        assert_eq!(config.steps_per_beat, 4);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EngineConfig::with_sample_rate(0.0).validate(),
            Err(ConfigError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            EngineConfig::from_ron("(tempo_bpm: 5000.0)"),
            Err(ConfigError::InvalidTempo(_))
        ));
        assert!(matches!(
            EngineConfig::from_ron("(steps_per_beat: 0)"),
            Err(ConfigError::InvalidStepsPerBeat(0))
        ));
    }

    #[test]
    fn test_malformed_ron() {
        assert!(matches!(
            EngineConfig::from_ron("(tempo_bpm: \"fast\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_ron_round_trip() {
        let config = EngineConfig {
            tempo_bpm: 133.0,
            seed: Some(7),
            ..EngineConfig::default()
        };
        let text = config.to_ron().unwrap();
        assert_eq!(EngineConfig::from_ron(&text).unwrap(), config);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");
        let config = EngineConfig::with_sample_rate(44100.0);
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
        assert!(matches!(
            EngineConfig::load(&dir.path().join("missing.ron")),
            Err(ConfigError::Io(_))
        ));
    }
}
