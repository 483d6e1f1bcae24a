//! `appstack apply` — Converge this host and restart the stack on change.

use std::path::PathBuf;

use appstack_common::config::DeploymentParams;
use appstack_compose::DeploymentPlan;
use appstack_compose::apply::{ApplyOptions, ComposeOrchestrator, apply_plan};
use appstack_compose::identity::NodeIdentity;
use clap::Args;

use crate::host::{DockerCompose, LocalFiles, SkipCompose};

/// Arguments for the `apply` command.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Prefix every managed path with this directory (staging).
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Leave owners, groups, and modes untouched.
    #[arg(long)]
    pub skip_ownership: bool,

    /// Write files but never touch the running stack.
    #[arg(long, conflicts_with = "force_restart")]
    pub no_restart: bool,

    /// Restart the stack even if nothing changed.
    #[arg(long)]
    pub force_restart: bool,
}

/// Executes the `apply` command.
///
/// # Errors
///
/// Returns an error if planning fails or any resource cannot be converged.
pub fn execute(
    args: &ApplyArgs,
    params: &DeploymentParams,
    identity: &dyn NodeIdentity,
) -> anyhow::Result<()> {
    let plan = DeploymentPlan::build(params, identity)?;
    let mut files = LocalFiles::new(args.root.clone(), !args.skip_ownership);
    let mut compose: Box<dyn ComposeOrchestrator> = if args.no_restart {
        Box::new(SkipCompose)
    } else {
        Box::new(DockerCompose::locate(args.root.clone())?)
    };
    let options = ApplyOptions {
        restart: !args.no_restart,
        force_restart: args.force_restart,
    };

    let report = apply_plan(&plan, &mut files, compose.as_mut(), options)?;

    for title in &report.applied {
        let marker = if report.changed.contains(title) { "~" } else { "=" };
        println!("  {marker} {title}");
    }
    println!();
    let project = &plan.config.project_name;
    if report.restarted {
        println!("  stack {project} restarted.");
    } else if report.changed.is_empty() {
        println!("  stack {project} unchanged.");
    } else {
        println!("  stack {project} has pending changes; run apply again to restart it.");
    }
    Ok(())
}
