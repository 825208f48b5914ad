//! CLI command definitions and dispatch.

pub mod deploy;
pub mod forget;
pub mod status;
pub mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stagehand_common::config::StagehandConfig;
use stagehand_common::constants::BIN_NAME;

/// Stagehand: deploy applications, then assert their resources resolve.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to a YAML configuration file.
    #[arg(long, global = true, env = "STAGEHAND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the state file (overrides the configuration).
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a descriptor and its application manifest, printing the start order.
    Validate(validate::ValidateArgs),
    /// Deploy a descriptor and check that expected resources resolve.
    Deploy(deploy::DeployArgs),
    /// List the deployment history recorded in the state file.
    Status(status::StatusArgs),
    /// Drop a deployment from the recorded history.
    Forget(forget::ForgetArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the command
/// fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Validate(args) => validate::execute(args, config),
        Command::Deploy(args) => deploy::execute(args, config),
        Command::Status(args) => status::execute(args, &config),
        Command::Forget(args) => forget::execute(&args, &config),
    }
}

/// Loads the configuration file if one was given, then applies flag
/// overrides.
fn load_config(cli: &Cli) -> anyhow::Result<StagehandConfig> {
    let mut config = match &cli.config {
        Some(path) => StagehandConfig::load(path)?,
        None => StagehandConfig::default(),
    };
    if let Some(state_file) = &cli.state_file {
        config.state_file.clone_from(state_file);
    }
    tracing::debug!(state_file = %config.state_file.display(), "configuration loaded");
    Ok(config)
}
