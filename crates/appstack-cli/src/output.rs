//! Formatted output helpers for CLI commands.
//!
//! Renders managed resources as short aligned lines and abbreviates
//! content digests.

use appstack_common::types::Sha256Hash;
use appstack_compose::resources::Resource;

const SHORT_DIGEST_LEN: usize = 12;

/// Abbreviates a digest to `sha256:` plus its first twelve hex digits.
#[must_use]
pub fn short_digest(digest: &Sha256Hash) -> String {
    let hex = digest.as_hex();
    format!("sha256:{}", &hex[..hex.len().min(SHORT_DIGEST_LEN)])
}

/// Describes a resource as one title line followed by attribute lines.
#[must_use]
pub fn describe(resource: &Resource) -> Vec<String> {
    let mut lines = vec![resource.title()];
    match resource {
        Resource::Group { ensure, .. } | Resource::ComposeTool { ensure } => {
            lines.push(format!("    ensure: {ensure}"));
        }
        Resource::ContainerEngine { log_driver } => {
            lines.push(format!("    log driver: {log_driver}"));
        }
        Resource::Directory {
            owner, group, mode, ..
        } => {
            lines.push(format!("    {owner}:{group} {mode}"));
        }
        Resource::File {
            owner,
            group,
            mode,
            digest,
            ..
        } => {
            lines.push(format!("    {owner}:{group} {mode} {}", short_digest(digest)));
        }
        Resource::Prerequisite { .. } => lines.push("    managed elsewhere".into()),
        Resource::Compose {
            requires,
            subscribes,
            ..
        } => {
            if !requires.is_empty() {
                lines.push(format!("    requires:   {}", requires.join(", ")));
            }
            if !subscribes.is_empty() {
                lines.push(format!("    subscribes: {}", subscribes.join(", ")));
            }
        }
    }
    lines
}
