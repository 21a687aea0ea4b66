pub mod cli_args;
pub mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use fullshot_capture::platform::fake::SimulatedBrowser;
use fullshot_capture::{take_screenshot, CommandResponse};
use fullshot_config::Config;
use std::path::PathBuf;
use tracing::{debug, error, info};

pub use cli_args::{Cli, Command};
use utils::{
    capture_options, default_scenario, initialize_logging, load_config_with_cli_overrides,
    load_scenario, write_output,
};

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    initialize_logging(cli.verbose);
    run_with(cli).await
}

/// Execute an already parsed command line.
pub async fn run_with(cli: Cli) -> Result<()> {
    match cli.command.clone() {
        Command::InitConfig { path, force } => init_config(path, force),
        Command::Capture {
            title,
            content_class,
            output,
        } => {
            let config = load_config_with_cli_overrides(&cli, content_class)?;
            let response = run_capture(&config, title).await?;
            finish(&config, response, output.as_deref())
        }
        Command::Simulate { scenario, output } => {
            let config = load_config_with_cli_overrides(&cli, None)?;
            let response = run_simulation(&config, scenario).await?;
            finish(&config, response, output.as_deref())
        }
    }
}

/// Run the pipeline against a simulated browser.
pub async fn run_simulation(config: &Config, scenario: Option<PathBuf>) -> Result<CommandResponse> {
    let scenario = match scenario {
        Some(path) => load_scenario(&path)?,
        None => default_scenario(),
    };
    let options = capture_options(config);
    debug!("Simulating {:?}", scenario);

    tokio::task::spawn_blocking(move || {
        let browser = SimulatedBrowser::new(scenario);
        take_screenshot(&browser, &browser, &options)
    })
    .await
    .context("Capture task panicked")
}

#[cfg(target_os = "windows")]
async fn run_capture(config: &Config, title: String) -> Result<CommandResponse> {
    use fullshot_capture::platform::windows::NativeWindowContext;
    use fullshot_capture::{create_platform, ErrorCode};

    let options = capture_options(config);
    let content_class = config.window.content_class.clone();

    tokio::task::spawn_blocking(move || -> Result<CommandResponse> {
        let context = match NativeWindowContext::find(&title, &content_class) {
            Ok(context) => context,
            Err(e) => return Ok(CommandResponse::error(ErrorCode::NoSuchWindow, e.to_string())),
        };
        let platform = create_platform()?;
        Ok(take_screenshot(&context, platform.as_ref(), &options))
    })
    .await
    .context("Capture task panicked")?
}

#[cfg(not(target_os = "windows"))]
async fn run_capture(_config: &Config, title: String) -> Result<CommandResponse> {
    fullshot_capture::create_platform()
        .with_context(|| format!("Cannot capture '{}'", title))?;
    anyhow::bail!("No native window lookup is available on this platform")
}

fn finish(config: &Config, response: CommandResponse, output: Option<&str>) -> Result<()> {
    println!("{}", response.to_json());

    match &response {
        CommandResponse::Success { value } => {
            if let Some(file) = output {
                if value.is_empty() {
                    info!("Capture produced no image, nothing written to {}", file);
                } else {
                    write_output(config, file, value)?;
                }
            }
            Ok(())
        }
        CommandResponse::Error { status, message } => {
            error!("Screenshot failed ({}): {}", status.as_str(), message);
            anyhow::bail!("{}", message)
        }
    }
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let Some(path) = path.or_else(Config::user_config_path) else {
        anyhow::bail!("Could not determine a home directory, pass --path");
    };
    if path.exists() && !force {
        anyhow::bail!(
            "Configuration file '{}' already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let path_str = path
        .to_str()
        .with_context(|| format!("Path '{}' is not valid UTF-8", path.display()))?;
    Config::default().save(path_str)?;
    info!("Wrote default configuration to {}", path.display());
    Ok(())
}
