//! `appstack render` — Print or write the rendered docker-compose file.

use std::path::PathBuf;

use anyhow::Context as _;
use appstack_common::config::DeploymentParams;
use appstack_compose::identity::NodeIdentity;
use appstack_compose::render::render_compose_text;
use appstack_compose::resolver::resolve;
use clap::Args;

/// Arguments for the `render` command.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `render` command.
///
/// # Errors
///
/// Returns an error if resolution fails or the output cannot be written.
pub fn execute(
    args: &RenderArgs,
    params: &DeploymentParams,
    identity: &dyn NodeIdentity,
) -> anyhow::Result<()> {
    let config = resolve(params, identity)?;
    let text = render_compose_text(&config);

    if let Some(ref out_path) = args.output {
        std::fs::write(out_path, &text)
            .with_context(|| format!("writing {}", out_path.display()))?;
        tracing::info!(path = %out_path.display(), "compose file written");
    } else {
        print!("{text}");
    }
    Ok(())
}
