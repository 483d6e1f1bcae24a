//! `appstack validate` — Check the deployment parameters.

use appstack_common::config::DeploymentParams;
use appstack_compose::auth::effective_mode;
use appstack_compose::validator::validate;
use clap::Args;

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Print nothing on success.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Executes the `validate` command.
///
/// # Errors
///
/// Returns an error if the parameters fail validation.
pub fn execute(args: &ValidateArgs, params: &DeploymentParams) -> anyhow::Result<()> {
    let validated = validate(params)?;
    if !args.quiet {
        println!("{}: parameters are valid", params.dns_name);
        println!("  ui tls:       {}", if params.ui_use_tls { "on" } else { "off" });
        println!("  query auth:   {}", effective_mode(params));
        println!(
            "  upload certs: {}",
            if validated.upload_certs().is_some() {
                "configured"
            } else {
                "trust on first use"
            }
        );
    }
    Ok(())
}
