// config.rs — client configuration: ember.toml plus command-line overrides.
//
// A missing config file is not an error (defaults apply); a malformed one
// is logged and ignored rather than aborting startup.

use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Default config file name, resolved against the working directory.
pub const CONFIG_FILE: &str = "ember.toml";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub window: WindowConfig,
    pub graphics: GraphicsConfig,
    pub timing: TimingConfig,
}

/// Window settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Ember".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
            resizable: true,
        }
    }
}

/// Graphics settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    pub vsync: bool,
    /// Enable VK_LAYER_KHRONOS_validation and the debug messenger.
    pub validation: bool,
    /// Directory holding compiled .spv shader binaries.
    pub shader_dir: String,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            vsync: true,
            validation: false,
            shader_dir: "assets/shaders".to_string(),
        }
    }
}

/// Fixed-timestep settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Catch-up bound: at most this many ticks run per rendered frame.
    pub max_ticks_per_frame: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            max_ticks_per_frame: 5,
        }
    }
}

impl ClientConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load the config file (if any) and apply command-line overrides.
    pub fn load(opts: &LaunchOptions) -> Self {
        let path = opts.config.as_deref().unwrap_or(CONFIG_FILE);

        let mut config = match fs::read_to_string(path) {
            Ok(text) => match Self::from_toml(&text) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path);
                    config
                }
                Err(e) => {
                    log::warn!("Ignoring malformed {}: {}", path, e);
                    Self::default()
                }
            },
            Err(_) => {
                if opts.config.is_some() {
                    log::warn!("Config file {} not found, using defaults", path);
                }
                Self::default()
            }
        };

        config.apply_overrides(opts);
        config
    }

    /// Command-line flags win over the config file.
    pub fn apply_overrides(&mut self, opts: &LaunchOptions) {
        if let Some(width) = opts.width {
            self.window.width = width;
        }
        if let Some(height) = opts.height {
            self.window.height = height;
        }
        if opts.fullscreen {
            self.window.fullscreen = true;
        }
        if opts.validation {
            self.graphics.validation = true;
        }
    }
}

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
pub struct LaunchOptions {
    pub config: Option<String>,
    pub data_dir: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fullscreen: bool,
    pub validation: bool,
    pub verbose: bool,
    pub help: bool,
}

impl LaunchOptions {
    pub const USAGE: &'static str = "\
usage: ember [options]
  --config <path>     config file (default: ember.toml)
  --data-dir <path>   working directory for assets, logs, crash reports
  --width <pixels>    window width override
  --height <pixels>   window height override
  --fullscreen        start fullscreen
  --validation        enable Vulkan validation layers
  --verbose           debug logging
  --help              show this help";

    /// Parse arguments (without the program name).
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self, String> {
        let mut opts = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => opts.config = Some(take_value(&mut args, &arg)?),
                "--data-dir" => opts.data_dir = Some(take_value(&mut args, &arg)?),
                "--width" => opts.width = Some(take_number(&mut args, &arg)?),
                "--height" => opts.height = Some(take_number(&mut args, &arg)?),
                "--fullscreen" => opts.fullscreen = true,
                "--validation" => opts.validation = true,
                "--verbose" => opts.verbose = true,
                "--help" | "-h" => opts.help = true,
                other => return Err(format!("Unknown argument: {}", other)),
            }
        }

        Ok(opts)
    }
}

fn take_value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("{} requires a value", flag))
}

fn take_number<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<u32, String> {
    let value = take_value(args, flag)?;
    value
        .parse()
        .map_err(|_| format!("{} requires a number, got '{}'", flag, value))
}

/// Resolve the data directory: change into it so every relative path
/// (assets, logs, crash-reports, ember.toml) follows.
pub fn enter_data_dir(dir: &Path) -> Result<(), String> {
    std::env::set_current_dir(dir)
        .map_err(|e| format!("Cannot enter data dir {}: {}", dir.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert!(config.graphics.vsync);
        assert!(!config.graphics.validation);
        assert_eq!(config.timing.tick_rate, 20);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml(
            "[window]\nwidth = 1920\nheight = 1080\n\n[timing]\ntick_rate = 60\n",
        )
        .unwrap();
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.window.title, "Ember");
        assert_eq!(config.timing.tick_rate, 60);
        assert_eq!(config.timing.max_ticks_per_frame, 5);
        assert!(config.graphics.vsync);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(ClientConfig::from_toml("[window\nwidth = ").is_err());
    }

    #[test]
    fn args_parse_and_override() {
        let opts = LaunchOptions::parse(
            ["--width", "800", "--height", "600", "--fullscreen", "--verbose"]
                .map(String::from),
        )
        .unwrap();
        assert_eq!(opts.width, Some(800));
        assert!(opts.fullscreen);
        assert!(opts.verbose);

        let mut config = ClientConfig::default();
        config.apply_overrides(&opts);
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert!(config.window.fullscreen);
    }

    #[test]
    fn args_reject_bad_input() {
        assert!(LaunchOptions::parse(["--width"].map(String::from)).is_err());
        assert!(LaunchOptions::parse(["--width", "abc"].map(String::from)).is_err());
        assert!(LaunchOptions::parse(["--frobnicate"].map(String::from)).is_err());
    }
}
