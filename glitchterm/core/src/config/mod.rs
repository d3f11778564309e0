//! TOML Configuration File Support
//!
//! Centralized configuration loading for the terminal, supporting a TOML
//! configuration file at `~/.config/glitchterm/terminal.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables (`GLITCHTERM_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/glitchterm/terminal.toml` (typically `~/.config/glitchterm/terminal.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [animation]
//! typing_speed_ms = 50
//! line_delay_ms = 500
//! stutter_probability = 0.1
//! glitch_probability = 0.03
//! seed = 2006
//!
//! [interpreter]
//! riddle_trigger = "2006"
//! boot_delay_ms = 500
//! about_lines = ["ARTIST INFORMATION", "NAME: [ARTIST NAME]"]
//!
//! [content]
//! path = "/home/me/.config/glitchterm/content.toml"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::AnimationConfig;
use crate::interpreter::InterpreterConfig;

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "GLITCHTERM_";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Animation section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationToml {
    /// Interval between typed characters in milliseconds
    pub typing_speed_ms: Option<u64>,

    /// Pause after each line of a typing sequence in milliseconds
    pub line_delay_ms: Option<u64>,

    /// Chance that a typing tick is skipped
    pub stutter_probability: Option<f64>,

    /// Chance that a character of a glitching line is marked
    pub glitch_probability: Option<f64>,

    /// Grace period before a crashed line is detached in milliseconds
    pub crash_grace_ms: Option<u64>,

    /// Cadence of simulated scrolling in milliseconds
    pub scroll_interval_ms: Option<u64>,

    /// Chance that a scrolled line is corrupted
    pub scroll_corruption_chance: Option<f64>,

    /// Corruption intensity for scrolled lines
    pub scroll_corruption_intensity: Option<f64>,

    /// Seed for reproducible effects
    pub seed: Option<u64>,
}

/// Interpreter section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterToml {
    /// Command that opens the riddle dialog
    pub riddle_trigger: Option<String>,

    /// Pause before the boot banner in milliseconds
    pub boot_delay_ms: Option<u64>,

    /// Pause before the reveal notice in milliseconds
    pub reveal_delay_ms: Option<u64>,

    /// Pause before the listing redraw in milliseconds
    pub reveal_render_delay_ms: Option<u64>,

    /// Number of celebration lines
    pub celebration_lines: Option<usize>,

    /// Lines shown by `about`
    pub about_lines: Option<Vec<String>>,

    /// Lines shown at boot
    pub banner_lines: Option<Vec<String>>,
}

/// Content section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentToml {
    /// Path to a TOML content file
    pub path: Option<PathBuf>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalToml {
    /// Animation configuration section
    pub animation: AnimationToml,

    /// Interpreter configuration section
    pub interpreter: InterpreterToml,

    /// Content configuration section
    pub content: ContentToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Centralized configuration for the terminal
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct TerminalConfig {
    /// Animation timings and probabilities
    pub animation: AnimationConfig,

    /// Interpreter timings and text
    pub interpreter: InterpreterConfig,

    /// Content file to load, demo content if `None`
    pub content_path: Option<PathBuf>,

    /// Seed for the random source, entropy if `None`
    pub seed: Option<u64>,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            animation: AnimationConfig::default(),
            interpreter: InterpreterConfig::default(),
            content_path: None,
            seed: None,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl TerminalConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for probabilities outside
    /// `[0, 1]`, a stutter probability of 1 (typing would never finish), zero
    /// tick intervals, or a blank riddle trigger.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.animation;
        let probabilities = [
            ("stutter_probability", a.stutter_probability),
            ("glitch_probability", a.glitch_probability),
            ("scroll_corruption_chance", a.scroll_corruption_chance),
            ("scroll_corruption_intensity", a.scroll_corruption_intensity),
            (
                "celebration_intensity",
                self.interpreter.celebration_intensity,
            ),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0 and 1, got {value}"
                )));
            }
        }
        if a.stutter_probability >= 1.0 {
            return Err(ConfigError::ValidationError(
                "stutter_probability must be below 1".to_string(),
            ));
        }
        if a.typing_speed.is_zero() {
            return Err(ConfigError::ValidationError(
                "typing_speed_ms must be greater than 0".to_string(),
            ));
        }
        if a.scroll_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "scroll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.interpreter.riddle_trigger.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "riddle_trigger must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/glitchterm/terminal.toml` or
/// `~/.config/glitchterm/terminal.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("glitchterm").join("terminal.toml"))
}

/// Load configuration from all sources with proper priority
///
/// CLI overrides are not handled here; apply [`ConfigOverrides`] after.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the merged values are out of range. A missing config file is not an
/// error (defaults are used).
pub fn load_config() -> Result<TerminalConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the result fails validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<TerminalConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration, reading environment overrides through `env`
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<TerminalConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = TerminalConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: TerminalToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut TerminalConfig, toml: &TerminalToml) {
    let anim = &toml.animation;
    if let Some(ms) = anim.typing_speed_ms {
        config.animation.typing_speed = Duration::from_millis(ms);
    }
    if let Some(ms) = anim.line_delay_ms {
        config.animation.line_delay = Duration::from_millis(ms);
    }
    if let Some(p) = anim.stutter_probability {
        config.animation.stutter_probability = p;
    }
    if let Some(p) = anim.glitch_probability {
        config.animation.glitch_probability = p;
    }
    if let Some(ms) = anim.crash_grace_ms {
        config.animation.crash_grace = Duration::from_millis(ms);
    }
    if let Some(ms) = anim.scroll_interval_ms {
        config.animation.scroll_interval = Duration::from_millis(ms);
    }
    if let Some(p) = anim.scroll_corruption_chance {
        config.animation.scroll_corruption_chance = p;
    }
    if let Some(p) = anim.scroll_corruption_intensity {
        config.animation.scroll_corruption_intensity = p;
    }
    if anim.seed.is_some() {
        config.seed = anim.seed;
    }

    let interp = &toml.interpreter;
    if let Some(ref trigger) = interp.riddle_trigger {
        config.interpreter.riddle_trigger = trigger.clone();
    }
    if let Some(ms) = interp.boot_delay_ms {
        config.interpreter.boot_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = interp.reveal_delay_ms {
        config.interpreter.reveal_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = interp.reveal_render_delay_ms {
        config.interpreter.reveal_render_delay = Duration::from_millis(ms);
    }
    if let Some(n) = interp.celebration_lines {
        config.interpreter.celebration_lines = n;
    }
    if let Some(ref lines) = interp.about_lines {
        config.interpreter.about_lines = lines.clone();
    }
    if let Some(ref lines) = interp.banner_lines {
        config.interpreter.banner_lines = lines.clone();
    }

    if toml.content.path.is_some() {
        config.content_path = toml.content.path.clone();
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut TerminalConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| env(&format!("{ENV_PREFIX}{name}"));

    if let Some(ms) = var("TYPING_SPEED_MS").and_then(|v| v.parse::<u64>().ok()) {
        config.animation.typing_speed = Duration::from_millis(ms);
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = var("LINE_DELAY_MS").and_then(|v| v.parse::<u64>().ok()) {
        config.animation.line_delay = Duration::from_millis(ms);
        config.source = ConfigSource::Env;
    }
    if let Some(p) = var("STUTTER_PROBABILITY").and_then(|v| v.parse::<f64>().ok()) {
        config.animation.stutter_probability = p;
        config.source = ConfigSource::Env;
    }
    if let Some(p) = var("GLITCH_PROBABILITY").and_then(|v| v.parse::<f64>().ok()) {
        config.animation.glitch_probability = p;
        config.source = ConfigSource::Env;
    }
    if let Some(seed) = var("SEED").and_then(|v| v.parse::<u64>().ok()) {
        config.seed = Some(seed);
        config.source = ConfigSource::Env;
    }
    if let Some(trigger) = var("RIDDLE_TRIGGER") {
        config.interpreter.riddle_trigger = trigger;
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = var("BOOT_DELAY_MS").and_then(|v| v.parse::<u64>().ok()) {
        config.interpreter.boot_delay = Duration::from_millis(ms);
        config.source = ConfigSource::Env;
    }
    if let Some(path) = var("CONTENT_PATH") {
        config.content_path = Some(PathBuf::from(path));
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Typing speed override (milliseconds)
    pub typing_speed_ms: Option<u64>,

    /// Riddle trigger override
    pub riddle_trigger: Option<String>,

    /// Content file override
    pub content_path: Option<PathBuf>,

    /// Random seed override
    pub seed: Option<u64>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set typing speed override
    #[must_use]
    pub fn with_typing_speed_ms(mut self, ms: u64) -> Self {
        self.typing_speed_ms = Some(ms);
        self
    }

    /// Set riddle trigger override
    #[must_use]
    pub fn with_riddle_trigger(mut self, trigger: String) -> Self {
        self.riddle_trigger = Some(trigger);
        self
    }

    /// Set content file override
    #[must_use]
    pub fn with_content_path(mut self, path: PathBuf) -> Self {
        self.content_path = Some(path);
        self
    }

    /// Set random seed override
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns a validation error if the overridden config is out of range.
    pub fn apply(&self, config: &mut TerminalConfig) -> Result<(), ConfigError> {
        if self.typing_speed_ms.is_some()
            || self.riddle_trigger.is_some()
            || self.content_path.is_some()
            || self.seed.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ms) = self.typing_speed_ms {
            config.animation.typing_speed = Duration::from_millis(ms);
        }
        if let Some(ref trigger) = self.riddle_trigger {
            config.interpreter.riddle_trigger = trigger.clone();
        }
        if let Some(ref path) = self.content_path {
            config.content_path = Some(path.clone());
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
