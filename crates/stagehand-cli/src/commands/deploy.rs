//! `stage deploy`: Deploy a descriptor and check its resources resolve.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use stagehand_common::config::StagehandConfig;
use stagehand_common::types::ResourceName;
use stagehand_runtime::engine::Deployer;
use stagehand_runtime::environment::local::LocalEnvironment;

use crate::output::{self, BOLD, DIM, GREEN, RED, RESET};

/// Arguments for the `deploy` command.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Path to the deployment descriptor.
    pub descriptor: PathBuf,

    /// Resource that must resolve after deployment (repeatable).
    #[arg(long = "expect", value_name = "NAME")]
    pub expect: Vec<ResourceName>,
}

/// Executes the `deploy` command.
///
/// Deploys into an in-process environment that records the deployment in
/// the state file, then resolves every `--expect` name.
///
/// # Errors
///
/// Returns an error if the deployment fails or any expected resource is
/// absent.
pub fn execute(args: DeployArgs, config: StagehandConfig) -> anyhow::Result<()> {
    let started = Instant::now();
    let environment = LocalEnvironment::persistent(config.clone());
    let deployer = Deployer::new(Box::new(environment), config);

    let receipt = deployer.deploy_file(&args.descriptor)?;
    let summary = &receipt.summary;
    eprintln!();
    eprintln!(
        "  {GREEN}{BOLD}{}{RESET} {BOLD}{}{RESET} {DIM}[{}]{RESET} in {:.2}s",
        output::format_outcome(&receipt.outcome),
        summary.name,
        output::short_id(&summary.id),
        started.elapsed().as_secs_f64()
    );
    eprintln!("    runtime:   {}", summary.runtime);
    eprintln!("    resources: {}", output::format_resources(&summary.resources));

    let missing = missing_resources(&deployer, &args.expect);
    for name in &args.expect {
        if missing.contains(&name) {
            eprintln!("    {RED}✗{RESET} {name}");
        } else {
            eprintln!("    {GREEN}●{RESET} {name}");
        }
    }

    if !missing.is_empty() {
        anyhow::bail!(
            "{} expected resource(s) did not resolve: {}",
            missing.len(),
            missing
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}

fn missing_resources<'a>(
    deployer: &Deployer,
    expected: &'a [ResourceName],
) -> Vec<&'a ResourceName> {
    expected
        .iter()
        .filter(|name| deployer.fetch(name).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(dir: &std::path::Path) -> PathBuf {
        let root = dir.join("app");
        std::fs::create_dir_all(root.join("config")).expect("mkdir");
        std::fs::write(
            root.join("config/stagehand.yml"),
            "services:\n  SimpleService: {}\nqueues:\n  /queue/container_queue: {}\n",
        )
        .expect("write manifest");
        let descriptor = dir.join("app.yml");
        std::fs::write(&descriptor, "application:\n  root: app\n").expect("write descriptor");
        descriptor
    }

    fn config(dir: &std::path::Path) -> StagehandConfig {
        StagehandConfig {
            state_file: dir.join("state.json"),
            ..StagehandConfig::default()
        }
    }

    #[test]
    fn deploy_succeeds_when_expectations_resolve() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = DeployArgs {
            descriptor: app(dir.path()),
            expect: vec![
                "service:SimpleService".parse().expect("name"),
                "/queue/container_queue".parse().expect("name"),
            ],
        };
        execute(args, config(dir.path())).expect("deploy");
        assert!(dir.path().join("state.json").exists());
    }

    #[test]
    fn deploy_fails_when_expectation_is_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = DeployArgs {
            descriptor: app(dir.path()),
            expect: vec!["/queue/absent".parse().expect("name")],
        };
        let err = execute(args, config(dir.path())).unwrap_err();
        assert!(err.to_string().contains("/queue/absent"), "got: {err}");
    }
}
