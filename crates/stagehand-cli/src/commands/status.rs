//! `stage status`: List the recorded deployment history.
//!
//! Every successful `stage deploy` leaves a record. Records outlive the
//! process that made them; `stage forget` removes one.

use clap::Args;
use stagehand_common::config::StagehandConfig;
use stagehand_runtime::state;

use crate::output;

/// Arguments for the `status` command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the raw state index as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `status` command.
///
/// # Errors
///
/// Returns an error if the state file exists but cannot be read.
pub fn execute(args: StatusArgs, config: &StagehandConfig) -> anyhow::Result<()> {
    let state = state::load_state(&config.state_file)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }
    if state.deployments.is_empty() {
        println!("No deployments recorded.");
        return Ok(());
    }
    println!("{}", output::history_header());
    print!("{}", output::deployment_table(&state.deployments));
    Ok(())
}
