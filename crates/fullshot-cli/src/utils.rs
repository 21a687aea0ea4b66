//! Utility functions for the fullshot CLI.

use anyhow::{Context, Result};
use fullshot_capture::encoder::decode_base64;
use fullshot_capture::platform::fake::Scenario;
use fullshot_capture::{CaptureOptions, WindowGeometry};
use fullshot_config::Config;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli_args::Cli;

/// Initialize logging. Output goes to stderr so stdout carries only the response.
pub fn initialize_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose { "debug" } else { "info" };
    let directives = format!(
        "fullshot={level},fullshot_cli={level},fullshot_capture={level},fullshot_config={level}"
    );
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

/// Load configuration with CLI overrides applied.
pub fn load_config_with_cli_overrides(cli: &Cli, content_class: Option<String>) -> Result<Config> {
    Config::load_with_overrides(cli.config.as_deref(), cli.output_dir.clone(), content_class)
}

pub fn capture_options(config: &Config) -> CaptureOptions {
    CaptureOptions {
        max_dimension: config.capture.max_dimension,
        sample_inset: config.capture.sample_inset,
        scrollbar_retention_px: config.capture.scrollbar_retention_px,
    }
}

/// A document three times taller than its viewport, used when `simulate`
/// is run without a scenario file.
pub fn default_scenario() -> Scenario {
    Scenario {
        window: WindowGeometry::new(1024, 768),
        chrome: WindowGeometry::new(24, 68),
        client_insets: WindowGeometry::new(200, 100),
        content: WindowGeometry::new(800, 1200),
        ..Scenario::default()
    }
}

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario '{}'", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse scenario '{}'", path.display()))
}

/// Decode a base64 PNG and write it below the configured output directory.
pub fn write_output(config: &Config, file: &str, encoded: &str) -> Result<PathBuf> {
    let path = config.output_path(file);
    let bytes = decode_base64(encoded).context("Screenshot value is not valid base64")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;
        }
    }
    std::fs::write(&path, &bytes)
        .with_context(|| format!("Failed to write '{}'", path.display()))?;

    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}
