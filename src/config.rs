//! Configuration loader and validator
//!
//! Loads transport and haptic settings from a TOML file. Every field has
//! a built-in default, so a missing file or a partial file is fine; an
//! out-of-range value is not.

use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::procon2::constants::{COMMAND_DELAY_MS, USB_READ_DELAY_MS, USB_READ_LEN};
use crate::procon2::transport::TransportSettings;

/// Default config file path, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "configs/default.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub haptics: HapticsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self { transport: TransportConfig::default(), haptics: HapticsConfig::default() }
    }
}

/// Transport timing and device settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Delay between handshake commands (milliseconds, must be > 0)
    #[serde(default = "default_command_delay_ms")]
    pub command_delay_ms: u64,

    /// Delay between a bulk write and the read-back (milliseconds)
    #[serde(default = "default_read_delay_ms")]
    pub read_delay_ms: u64,

    /// Maximum best-effort read length (bytes, 1..=512)
    #[serde(default = "default_read_len")]
    pub read_len: usize,

    /// Player LED slot lit after the handshake (1..=4)
    #[serde(default = "default_player_led")]
    pub player_led: u8,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            command_delay_ms: default_command_delay_ms(),
            read_delay_ms: default_read_delay_ms(),
            read_len: default_read_len(),
            player_led: default_player_led(),
        }
    }
}

/// Haptic playback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HapticsConfig {
    /// Preset played by the demo binary on connect
    #[serde(default = "default_preset")]
    pub default_preset: String,

    /// Default tone frequency in Hz
    #[serde(default = "default_frequency")]
    pub frequency: f32,

    /// Default tone amplitude in [0, 1]
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
}

impl Default for HapticsConfig {
    fn default() -> Self {
        Self {
            default_preset: default_preset(),
            frequency: default_frequency(),
            amplitude: default_amplitude(),
        }
    }
}

fn default_command_delay_ms() -> u64 {
    COMMAND_DELAY_MS
}

fn default_read_delay_ms() -> u64 {
    USB_READ_DELAY_MS
}

fn default_read_len() -> usize {
    USB_READ_LEN
}

fn default_player_led() -> u8 {
    1
}

fn default_preset() -> String {
    "medium".to_string()
}

fn default_frequency() -> f32 {
    320.0
}

fn default_amplitude() -> f32 {
    0.5
}

impl Config {
    /// Load and validate a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        info!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Load the default config file, falling back to built-in defaults
    /// when it does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load(DEFAULT_CONFIG_PATH)
        } else {
            warn!("No config file at {DEFAULT_CONFIG_PATH}, using built-in defaults");
            Ok(Self::default())
        }
    }

    /// Reject out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transport.command_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "transport.command_delay_ms must be greater than zero".to_string(),
            ));
        }
        if self.transport.read_len == 0 || self.transport.read_len > 512 {
            return Err(ConfigError::Invalid(format!(
                "transport.read_len must be in 1..=512, got {}",
                self.transport.read_len
            )));
        }
        if !(1..=4).contains(&self.transport.player_led) {
            return Err(ConfigError::Invalid(format!(
                "transport.player_led must be in 1..=4, got {}",
                self.transport.player_led
            )));
        }
        if !(0.0..=1.0).contains(&self.haptics.amplitude) {
            return Err(ConfigError::Invalid(format!(
                "haptics.amplitude must be in 0..=1, got {}",
                self.haptics.amplitude
            )));
        }
        if self.haptics.frequency <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "haptics.frequency must be positive, got {}",
                self.haptics.frequency
            )));
        }
        Ok(())
    }

    /// Transport timing derived from this config.
    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            command_delay: Duration::from_millis(self.transport.command_delay_ms),
            read_delay: Duration::from_millis(self.transport.read_delay_ms),
            read_len: self.transport.read_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_command_delay() {
        let mut config = Config::default();
        config.transport.command_delay_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_out_of_range_player_led() {
        let mut config = Config::default();
        config.transport.player_led = 5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_out_of_range_amplitude() {
        let mut config = Config::default();
        config.haptics.amplitude = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [transport]
            command_delay_ms = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.transport.command_delay_ms, 25);
        assert_eq!(config.transport.player_led, 1);
        assert_eq!(config.haptics.default_preset, "medium");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn transport_settings_reflect_config() {
        let mut config = Config::default();
        config.transport.command_delay_ms = 42;
        let settings = config.transport_settings();
        assert_eq!(settings.command_delay, Duration::from_millis(42));
        assert_eq!(settings.read_len, USB_READ_LEN);
    }
}
