//! Build step that runs Android tests on a virtual device testing service.
//!
//! Every input is read from the step's environment variables and can be
//! overridden with the matching flag.
//!
//! # Usage
//!
//! ```bash
//! # Instrumentation test on two devices
//! export api_base_url=https://vdt.example.com/test api_token=... \
//!        BITRISE_APP_SLUG=... BITRISE_BUILD_SLUG=...
//! vdtest --test-type instrumentation \
//!        --apk-path app/build/outputs/apk/debug/app-debug.apk \
//!        --test-apk-path app/build/outputs/apk/androidTest/debug/app-debug-androidTest.apk \
//!        --test-devices $'NexusLowRes,24,en,portrait\nPixel2,28,en,landscape'
//!
//! # Robo test, downloading the produced assets
//! vdtest --test-type robo --apk-path app.apk --download-test-results true
//! ```
//!
//! Exits 0 when every device passed, 1 otherwise.

mod inputs;
mod output;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use vdtest_core::assets::DOWNLOADED_FILES_DIR_ENV;
use vdtest_core::client::{ClientError, HttpTestClient};
use vdtest_core::config::ConfigError;
use vdtest_core::runner::{run, RunError};

use inputs::StepInputs;
use output::ConsoleSink;

/// Runs an Android test matrix on a virtual device testing service.
#[derive(Parser)]
#[command(name = "vdtest")]
#[command(about = "Run Android tests on virtual devices and report the results")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    inputs: StepInputs,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("Error: {}", e).red());
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Client(ClientError),
    Run(RunError),
    TestsFailed,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "{}", e),
            CliError::Client(e) => write!(f, "{}", e),
            CliError::Run(e) => write!(f, "{}", e),
            CliError::TestsFailed => write!(f, "Test failed on at least one device"),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<ClientError> for CliError {
    fn from(e: ClientError) -> Self {
        CliError::Client(e)
    }
}

impl From<RunError> for CliError {
    fn from(e: RunError) -> Self {
        CliError::Run(e)
    }
}

async fn execute(cli: Cli) -> Result<(), CliError> {
    println!();
    println!("{}", cli.inputs.summary());
    println!();

    let (config, poll) = cli.inputs.into_config()?;
    debug!(?config, "configuration loaded");

    let client = HttpTestClient::new(config.api.clone())?;
    let mut sink = ConsoleSink;
    let summary = run(&config, &client, &poll, &mut sink).await?;

    if let Some(dir) = &summary.assets_dir {
        export_assets_dir(dir);
    }

    if summary.successful() {
        Ok(())
    } else {
        Err(CliError::TestsFailed)
    }
}

/// Publishes the asset directory to later build steps through envman.
/// A failed export only warns.
fn export_assets_dir(dir: &Path) {
    let value = dir.to_string_lossy().into_owned();
    let result = std::process::Command::new("envman")
        .args(["add", "--key", DOWNLOADED_FILES_DIR_ENV, "--value", value.as_str()])
        .output();

    match result {
        Ok(output) if output.status.success() => {
            println!(
                "The downloaded test assets path ({}) is exported to the {} environment variable.",
                value, DOWNLOADED_FILES_DIR_ENV
            );
        }
        Ok(output) => {
            warn!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Failed to export environment ({})", DOWNLOADED_FILES_DIR_ENV
            );
        }
        Err(e) => {
            warn!(error = %e, "Failed to export environment ({})", DOWNLOADED_FILES_DIR_ENV);
        }
    }
}
