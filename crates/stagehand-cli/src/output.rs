//! Formatted output helpers for CLI commands.
//!
//! Provides table formatting, colored status indicators, and short
//! human-readable forms of deployment data.

use std::fmt::Write as _;

use stagehand_common::constants::{APP_NAME, BIN_NAME};
use stagehand_common::types::{DeploymentId, ResourceName};
use stagehand_runtime::environment::{DeployOutcome, DeploymentSummary};

pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const GREEN: &str = "\x1b[32m";
pub const RED: &str = "\x1b[31m";
pub const RESET: &str = "\x1b[0m";

const SHORT_ID_LEN: usize = 8;

/// A horizontal rule of `width` box-drawing characters.
#[must_use]
pub fn rule(width: usize) -> String {
    "\u{2550}".repeat(width)
}

/// First characters of a deployment id, enough to tell deployments apart.
#[must_use]
pub fn short_id(id: &DeploymentId) -> &str {
    let s = id.as_str();
    s.char_indices()
        .nth(SHORT_ID_LEN)
        .map_or(s, |(end, _)| &s[..end])
}

/// Verb describing what a deploy call did.
#[must_use]
pub const fn format_outcome(outcome: &DeployOutcome) -> &'static str {
    match outcome {
        DeployOutcome::Created => "Deployed",
        DeployOutcome::Unchanged => "Unchanged",
        DeployOutcome::Replaced { .. } => "Replaced",
    }
}

/// Comma-separated resource names, or `-` when there are none.
#[must_use]
pub fn format_resources(resources: &[ResourceName]) -> String {
    if resources.is_empty() {
        return "-".into();
    }
    resources
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Title line for `status`: records are history, not live deployments.
#[must_use]
pub fn history_header() -> String {
    format!(
        "{BOLD}Recorded {APP_NAME} deployments{RESET} \
         {DIM}(history; `{BIN_NAME} forget <name>` removes a record){RESET}"
    )
}

/// Renders deployments as an aligned table, one row per deployment.
#[must_use]
pub fn deployment_table(deployments: &[DeploymentSummary]) -> String {
    let mut out = format!(
        "{:<10} {:<20} {:<8} {:<26} {}\n",
        "ID", "NAME", "RUNTIME", "DEPLOYED", "RESOURCES"
    );
    for d in deployments {
        let _ = writeln!(
            out,
            "{:<10} {:<20} {:<8} {:<26} {}",
            short_id(&d.id),
            d.name,
            d.runtime,
            d.deployed_at,
            format_resources(&d.resources)
        );
    }
    out
}
