use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Searched in order when no explicit path is given.
const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "./fullshot.toml",
    "~/.config/fullshot/config.toml",
    "~/.fullshot.toml",
];

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Largest capture width or height in pixels
    #[serde(default = "default_max_dimension")]
    pub max_dimension: i32,
    /// Band along the right and bottom edges ignored by the blank-image check
    #[serde(default = "default_sample_inset")]
    pub sample_inset: i32,
    /// Pixels removed from a grown height to keep the vertical scrollbar
    #[serde(default = "default_scrollbar_retention_px")]
    pub scrollbar_retention_px: i32,
}

fn default_max_dimension() -> i32 {
    65534
}

fn default_sample_inset() -> i32 {
    17
}

fn default_scrollbar_retention_px() -> i32 {
    2
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            sample_inset: default_sample_inset(),
            scrollbar_retention_px: default_scrollbar_retention_px(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Class name of the child window hosting the rendered document
    #[serde(default = "default_content_class")]
    pub content_class: String,
}

fn default_content_class() -> String {
    "Internet Explorer_Server".to_string()
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            content_class: default_content_class(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory that relative `--output` paths are resolved against
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

fn default_output_directory() -> String {
    ".".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

impl Config {
    /// Load from `config_path`, or from the first default location that
    /// exists, or fall back to defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path_to_load = match config_path {
            Some(path) => {
                let expanded = shellexpand::tilde(path).to_string();
                if !Path::new(&expanded).exists() {
                    anyhow::bail!("Configuration file '{}' does not exist", path);
                }
                Some(expanded)
            }
            None => DEFAULT_CONFIG_PATHS.iter().find_map(|path| {
                let expanded_path = shellexpand::tilde(path);
                if Path::new(expanded_path.as_ref()).exists() {
                    Some(expanded_path.to_string())
                } else {
                    None
                }
            }),
        };

        let Some(path) = path_to_load else {
            tracing::debug!("No configuration file found, using defaults");
            return Ok(Self::default());
        };

        let config_content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration file '{}'", path))?;
        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse configuration file '{}'", path))?;
        config.validate()?;

        tracing::debug!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Load and apply command line overrides.
    pub fn load_with_overrides(
        config_path: Option<&str>,
        output_dir_override: Option<String>,
        content_class_override: Option<String>,
    ) -> Result<Self> {
        let mut config = Self::load(config_path)?;

        if let Some(directory) = output_dir_override {
            config.output.directory = directory;
        }
        if let Some(class) = content_class_override {
            config.window.content_class = class;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let capture = &self.capture;
        if capture.max_dimension < 1 || capture.max_dimension > 65534 {
            anyhow::bail!(
                "capture.max_dimension must be between 1 and 65534, got {}",
                capture.max_dimension
            );
        }
        if capture.sample_inset < 0 {
            anyhow::bail!("capture.sample_inset cannot be negative, got {}", capture.sample_inset);
        }
        if capture.scrollbar_retention_px < 0 {
            anyhow::bail!(
                "capture.scrollbar_retention_px cannot be negative, got {}",
                capture.scrollbar_retention_px
            );
        }
        if self.window.content_class.trim().is_empty() {
            anyhow::bail!("window.content_class cannot be empty");
        }
        Ok(())
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// Resolve an output file name against `output.directory`.
    pub fn output_path(&self, file: &str) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(file).as_ref());
        if expanded.is_absolute() {
            return expanded;
        }
        let directory = shellexpand::tilde(&self.output.directory).to_string();
        Path::new(&directory).join(expanded)
    }

    /// Default location for a user-level configuration file.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("fullshot");
            path.push("config.toml");
            path
        })
    }
}
