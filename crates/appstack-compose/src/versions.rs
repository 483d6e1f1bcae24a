//! Image tag resolution.
//!
//! Each application image resolves its tag independently:
//! service-specific version, then `data_entitlement_version`, then the
//! global `version`, then [`DEFAULT_VERSION`](appstack_common::constants::DEFAULT_VERSION).

use appstack_common::config::DeploymentParams;
use appstack_common::constants::DEFAULT_VERSION;

use crate::validator::non_empty_str;

/// Resolved tags of the application images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTags {
    /// Tag of the backend image.
    pub data_entitlement: String,
    /// Tag of the UI proxy image.
    pub ui: String,
    /// Tag of the frontend image.
    pub frontend: String,
}

/// Resolves the three application image tags.
#[must_use]
pub fn resolve_versions(params: &DeploymentParams) -> ImageTags {
    let category = non_empty_str(params.data_entitlement_version.as_ref());
    let global = non_empty_str(params.version.as_ref());
    let pick = |specific: Option<&str>| {
        specific
            .or(category)
            .or(global)
            .unwrap_or(DEFAULT_VERSION)
            .to_string()
    };

    let tags = ImageTags {
        data_entitlement: pick(None),
        ui: pick(non_empty_str(params.ui_version.as_ref())),
        frontend: pick(non_empty_str(params.frontend_version.as_ref())),
    };
    tracing::debug!(
        data_entitlement = %tags.data_entitlement,
        ui = %tags.ui,
        frontend = %tags.frontend,
        "resolved image tags"
    );
    tags
}
