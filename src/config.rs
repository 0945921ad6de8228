use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_DIAGNOSTICS_INTERVAL: Duration = Duration::from_secs(2);

/// Distance model and cone shape shared by every effect instance's panner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PannerSettings {
    pub ref_distance: f32,
    pub max_distance: f32,
    pub rolloff_factor: f32,
    /// Degrees; 360 is omnidirectional
    pub cone_inner_angle: f32,
    pub cone_outer_angle: f32,
    pub cone_outer_gain: f32,
}

impl Default for PannerSettings {
    fn default() -> Self {
        Self {
            ref_distance: 1.0,
            max_distance: 100.0,
            rolloff_factor: 2.0,
            cone_inner_angle: 360.0,
            cone_outer_angle: 360.0,
            cone_outer_gain: 0.0,
        }
    }
}

/// Engine configuration
///
/// Every field has a default, so a config file only needs the values it
/// changes:
///
/// ```json
/// { "sampleRate": 44100, "defaultRadius": 3.0, "panner": { "rolloffFactor": 1.0 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub sample_rate: u32,
    /// Frames per graph processing block
    pub buffer_size: usize,
    /// Influence radius given to new effect instances
    pub default_radius: f32,
    /// Weight of the newest sample in the listener intensity follower
    pub intensity_smoothing: f32,
    /// Minimum wall-clock gap between proximity diagnostics
    pub diagnostics_interval_secs: f32,
    pub command_queue_capacity: usize,
    pub panner: PannerSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 512,
            default_radius: 2.0,
            intensity_smoothing: 0.1,
            diagnostics_interval_secs: 2.0,
            command_queue_capacity: 256,
            panner: PannerSettings::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Proximity diagnostics throttle; out-of-range values fall back to 2 s
    pub fn diagnostics_interval(&self) -> Duration {
        match Duration::try_from_secs_f32(self.diagnostics_interval_secs.max(0.0)) {
            Ok(interval) => interval,
            Err(e) => {
                log::warn!(
                    "Invalid diagnostics interval {}s ({}), using {:?}",
                    self.diagnostics_interval_secs,
                    e,
                    DEFAULT_DIAGNOSTICS_INTERVAL
                );
                DEFAULT_DIAGNOSTICS_INTERVAL
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"sampleRate": 44100, "panner": {"rolloffFactor": 1.0}}"#).unwrap();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.default_radius, 2.0);
        assert_eq!(config.panner.rolloff_factor, 1.0);
        assert_eq!(config.panner.max_distance, 100.0);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
        assert_eq!(EngineConfig::default().diagnostics_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_bad_config_is_parse_error() {
        assert!(matches!(EngineConfig::from_json("{\"sampleRate\": \"fast\"}"), Err(ConfigError::Parse(_))));
        assert!(matches!(EngineConfig::load("/nonexistent/zone-fx.json"), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_oversized_diagnostics_interval_falls_back() {
        let config = EngineConfig::from_json(r#"{"diagnosticsIntervalSecs": 1e30}"#).unwrap();
        assert_eq!(config.diagnostics_interval(), Duration::from_secs(2));

        let config = EngineConfig::from_json(r#"{"diagnosticsIntervalSecs": -5.0}"#).unwrap();
        assert_eq!(config.diagnostics_interval(), Duration::ZERO);
    }
}
