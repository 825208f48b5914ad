//! `stage validate`: Check a descriptor without deploying it.

use std::path::PathBuf;

use clap::Args;
use stagehand_common::config::StagehandConfig;
use stagehand_descriptor::parser;
use stagehand_runtime::engine::Deployer;

use crate::output;

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the deployment descriptor.
    pub descriptor: PathBuf,
}

/// Executes the `validate` command.
///
/// Parses the descriptor, resolves the runtime, loads the application
/// manifest, and prints the order resources would start in.
///
/// # Errors
///
/// Returns an error if the descriptor or manifest is malformed, the root
/// is unreachable, or the runtime is unsupported.
pub fn execute(args: ValidateArgs, config: StagehandConfig) -> anyhow::Result<()> {
    let descriptor = parser::parse_descriptor_file(&args.descriptor)?;
    let deployer = Deployer::local(config);
    let plan = deployer.plan(&descriptor)?;

    println!("Deployment plan for: {}", args.descriptor.display());
    println!("{}", output::rule(40));
    println!("  name:    {}", plan.name);
    println!("  root:    {}", plan.application_root.display());
    println!("  runtime: {}", plan.runtime);
    println!();
    for name in &plan.order {
        println!("  + {name}");
    }
    println!();
    println!("  {} resource(s) will be started.", plan.order.len());
    Ok(())
}
