//! `appstack plan` — Display the managed resources before applying.

use appstack_common::config::DeploymentParams;
use appstack_compose::DeploymentPlan;
use appstack_compose::identity::NodeIdentity;
use appstack_compose::resources::Resource;
use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::output;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Output format.
    #[arg(long, value_enum, default_value_t = PlanFormat::Text)]
    pub format: PlanFormat,
}

/// Output format of `plan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    /// Human-readable listing.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Serialize)]
struct PlanView<'a> {
    project: &'a str,
    compose_file: &'a std::path::Path,
    compose_digest: String,
    auth_mode: String,
    prerequisites: &'a [std::path::PathBuf],
    resources: Vec<&'a Resource>,
}

/// Executes the `plan` command.
///
/// Validates and resolves the parameters, orders the resources, and
/// displays them in the order `apply` converges them.
///
/// # Errors
///
/// Returns an error if resolution or ordering fails.
pub fn execute(
    args: &PlanArgs,
    params: &DeploymentParams,
    identity: &dyn NodeIdentity,
) -> anyhow::Result<()> {
    let plan = DeploymentPlan::build(params, identity)?;

    match args.format {
        PlanFormat::Json => {
            let view = PlanView {
                project: &plan.config.project_name,
                compose_file: &plan.config.compose_file,
                compose_digest: plan.compose_digest.to_string(),
                auth_mode: plan.config.auth_mode.to_string(),
                prerequisites: &plan.config.prerequisites,
                resources: plan.ordered_resources().collect(),
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        PlanFormat::Text => {
            println!("Deployment Plan for: {}", plan.config.dns_name);
            println!("{}", "\u{2550}".repeat(35));
            println!();
            for resource in plan.ordered_resources() {
                for line in output::describe(resource) {
                    println!("  {line}");
                }
            }
            println!();
            println!("  {} resource(s) managed.", plan.resources.len());
            println!("  compose digest: {}", output::short_digest(&plan.compose_digest));
        }
    }
    Ok(())
}
