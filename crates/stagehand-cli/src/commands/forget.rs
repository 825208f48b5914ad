//! `stage forget`: Drop a deployment from the state index.

use clap::Args;
use stagehand_common::config::StagehandConfig;
use stagehand_runtime::state;

/// Arguments for the `forget` command.
#[derive(Args, Debug)]
pub struct ForgetArgs {
    /// Name of the recorded deployment.
    pub name: String,
}

/// Executes the `forget` command.
///
/// Only the record is removed; the state index never owns live resources.
///
/// # Errors
///
/// Returns an error if no deployment of that name is recorded or the state
/// file cannot be read or written.
pub fn execute(args: &ForgetArgs, config: &StagehandConfig) -> anyhow::Result<()> {
    let recorded = state::load_state(&config.state_file)?;
    if !recorded.deployments.iter().any(|d| d.name == args.name) {
        anyhow::bail!("no deployment named \"{}\" is recorded", args.name);
    }
    state::forget(&config.state_file, &args.name)?;
    tracing::info!(name = %args.name, "deployment record removed");
    println!("Forgot {}", args.name);
    Ok(())
}
