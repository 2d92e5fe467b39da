//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::controller::state::{ControllerSlot, MAX_SLOTS};
use crate::discovery::toggle::ButtonEdgeConfig;
use crate::error::{Ds4BridgeError, Result};
use crate::lifecycle::{PairedLedPolicy, PAIRED_LED_SLOT};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub button: ButtonConfig,
    #[serde(default)]
    pub pairing: PairingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

/// Discovery button wiring
#[derive(Debug, Deserialize, Clone)]
pub struct ButtonConfig {
    #[serde(default)]
    pub pin: u32,

    #[serde(default = "default_pull_up")]
    pub pull_up: bool,
}

/// Pairing indicator
#[derive(Debug, Deserialize, Clone)]
pub struct PairingConfig {
    #[serde(default = "default_led_enabled")]
    pub led_enabled: bool,

    #[serde(default = "default_led_slot")]
    pub led_slot: u8,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily rolling log files. Console only when unset.
    #[serde(default)]
    pub log_dir: Option<String>,
}

/// Script replay configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReplayConfig {
    #[serde(default)]
    pub step_delay_ms: u64,
}

// Default value functions
fn default_pull_up() -> bool { true }

fn default_led_enabled() -> bool { true }
fn default_led_slot() -> u8 { PAIRED_LED_SLOT.index() }

fn default_log_level() -> String { "info".to_string() }

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            pin: 0,
            pull_up: default_pull_up(),
        }
    }
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            led_enabled: default_led_enabled(),
            led_slot: default_led_slot(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: None,
        }
    }
}

/// Accepted values for `logging.level`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn invalid(message: impl std::fmt::Display) -> Ds4BridgeError {
    Ds4BridgeError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ds4_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.pairing.led_slot >= MAX_SLOTS {
            return Err(invalid(format!(
                "pairing.led_slot must be less than {}",
                MAX_SLOTS
            )));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "logging.level must be one of: {}",
                LOG_LEVELS.join(", ")
            )));
        }

        if matches!(&self.logging.log_dir, Some(dir) if dir.is_empty()) {
            return Err(invalid("logging.log_dir cannot be empty when set"));
        }

        if self.replay.step_delay_ms > 60000 {
            return Err(invalid("replay.step_delay_ms must be at most 60000"));
        }

        Ok(())
    }

    /// GPIO settings for the discovery button
    #[must_use]
    pub fn button_edge(&self) -> ButtonEdgeConfig {
        ButtonEdgeConfig::for_wiring(self.button.pin, self.button.pull_up)
    }

    /// Where the pairing indicator goes
    ///
    /// # Errors
    ///
    /// Returns `InvalidSlot` if `pairing.led_slot` is out of range.
    pub fn paired_led_policy(&self) -> Result<PairedLedPolicy> {
        if !self.pairing.led_enabled {
            return Ok(PairedLedPolicy::Disabled);
        }
        Ok(PairedLedPolicy::FixedSlot(ControllerSlot::new(
            self.pairing.led_slot,
        )?))
    }
}
