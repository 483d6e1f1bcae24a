//! Deployment plan: everything a collaborator needs to converge the host.

use appstack_common::config::DeploymentParams;
use appstack_common::error::Result;
use appstack_common::types::Sha256Hash;
use sha2::{Digest, Sha256};

use crate::graph::DependencyGraph;
use crate::identity::NodeIdentity;
use crate::render::render_compose_text;
use crate::resolver::{ResolvedConfig, resolve};
use crate::resources::{Resource, plan_resources};

/// Resolved configuration, rendered compose text, and ordered resources.
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    /// Resolved configuration.
    pub config: ResolvedConfig,
    /// Rendered compose document.
    pub compose_text: String,
    /// Digest of `compose_text`.
    pub compose_digest: Sha256Hash,
    /// Resources in declaration order.
    pub resources: Vec<Resource>,
    /// Resource titles in convergence order.
    pub order: Vec<String>,
}

impl DeploymentPlan {
    /// Validates, resolves, renders, and orders the deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the resource graph has a cycle.
    pub fn build(params: &DeploymentParams, identity: &dyn NodeIdentity) -> Result<Self> {
        let config = resolve(params, identity)?;
        let compose_text = render_compose_text(&config);
        let compose_digest = digest(&compose_text);
        let resources = plan_resources(params, &config, &compose_text, &compose_digest);
        let order = DependencyGraph::from_resources(&resources).resolve_order()?;

        tracing::info!(
            project = %config.project_name,
            digest = %compose_digest,
            resources = resources.len(),
            "deployment plan ready"
        );

        Ok(Self {
            config,
            compose_text,
            compose_digest,
            resources,
            order,
        })
    }

    /// Looks up a resource by title.
    #[must_use]
    pub fn resource(&self, title: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.title() == title)
    }

    /// Resources in convergence order.
    pub fn ordered_resources(&self) -> impl Iterator<Item = &Resource> {
        self.order.iter().filter_map(|title| self.resource(title))
    }
}

/// SHA-256 of rendered content.
#[must_use]
pub fn digest(content: &str) -> Sha256Hash {
    digest_bytes(content.as_bytes())
}

/// SHA-256 of raw file content.
#[must_use]
pub fn digest_bytes(bytes: &[u8]) -> Sha256Hash {
    Sha256Hash::from_digest(Sha256::digest(bytes).as_slice())
}
