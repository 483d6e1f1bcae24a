//! CLI command definitions and dispatch.

pub mod apply;
pub mod plan;
pub mod render;
pub mod validate;

use std::path::PathBuf;

use anyhow::Context as _;
use appstack_common::config::DeploymentParams;
use appstack_common::constants::DEFAULT_AGENT_SSL_DIR;
use appstack_compose::identity::PuppetIdentity;
use clap::{Parser, Subcommand, ValueEnum};

/// appstack — declarative docker-compose deployment of the application stack.
#[derive(Parser, Debug)]
#[command(name = "appstack", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to the YAML deployment parameters.
    #[arg(short, long, global = true, env = "APPSTACK_PARAMS", default_value = "params.yaml")]
    pub params: PathBuf,

    /// Certificate name of this node (defaults to the stack's dns_name).
    #[arg(long, global = true, env = "APPSTACK_CERTNAME")]
    pub certname: Option<String>,

    /// SSL directory of the node's agent.
    #[arg(long, global = true, default_value = DEFAULT_AGENT_SSL_DIR)]
    pub ssl_dir: PathBuf,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the parameters without rendering anything.
    Validate(validate::ValidateArgs),
    /// Print or write the rendered docker-compose file.
    Render(render::RenderArgs),
    /// Display the managed resources in convergence order.
    Plan(plan::PlanArgs),
    /// Converge this host and restart the stack when it changed.
    Apply(apply::ApplyArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let params = load_params(&cli)?;
    let identity = node_identity(&cli, &params);
    match cli.command {
        Command::Validate(args) => validate::execute(&args, &params),
        Command::Render(args) => render::execute(&args, &params, &identity),
        Command::Plan(args) => plan::execute(&args, &params, &identity),
        Command::Apply(args) => apply::execute(&args, &params, &identity),
    }
}

fn load_params(cli: &Cli) -> anyhow::Result<DeploymentParams> {
    DeploymentParams::load(&cli.params)
        .with_context(|| format!("loading parameters from {}", cli.params.display()))
}

fn node_identity(cli: &Cli, params: &DeploymentParams) -> PuppetIdentity {
    let certname = cli
        .certname
        .clone()
        .unwrap_or_else(|| params.dns_name.clone());
    PuppetIdentity::new(certname).with_ssl_dir(cli.ssl_dir.clone())
}
