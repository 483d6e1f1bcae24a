//! Managed resource descriptors.
//!
//! Each resource carries the attributes a file-management or orchestration
//! collaborator needs to converge it. Titles follow the `Kind[name]` form and
//! identify resources in the dependency graph.

use std::path::PathBuf;

use appstack_common::config::DeploymentParams;
use appstack_common::constants::{
    COMPOSE_FILE_MODE, COMPOSE_FILE_OWNER, DIRECTORY_MODE, DOCKER_GROUP, SERVICE_UID,
};
use appstack_common::types::{Ensure, Sha256Hash};
use serde::Serialize;

use crate::resolver::{ResolvedConfig, SERVICE_DATA_PATHS, service_data_dir};

/// A resource the deployment manages or waits on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource {
    /// A system group.
    Group {
        /// Group name.
        name: String,
        /// Desired state.
        ensure: Ensure,
    },
    /// The container engine and its log driver.
    ContainerEngine {
        /// Log driver for all containers.
        log_driver: String,
    },
    /// The compose tool.
    ComposeTool {
        /// Desired state.
        ensure: Ensure,
    },
    /// A managed directory.
    Directory {
        /// Absolute path.
        path: PathBuf,
        /// Owning user.
        owner: String,
        /// Owning group.
        group: String,
        /// Octal mode.
        mode: String,
    },
    /// A managed file with rendered content.
    File {
        /// Absolute path.
        path: PathBuf,
        /// Owning user.
        owner: String,
        /// Owning group.
        group: String,
        /// Octal mode.
        mode: String,
        /// File content. May hold credentials and is never serialized.
        #[serde(skip)]
        content: String,
        /// Digest of `content`.
        digest: Sha256Hash,
    },
    /// A file managed elsewhere that the stack waits on and watches.
    Prerequisite {
        /// Absolute path.
        path: PathBuf,
    },
    /// The compose invocation.
    Compose {
        /// Compose project name.
        project: String,
        /// Compose files passed to the tool.
        compose_files: Vec<PathBuf>,
        /// Titles that must be converged first.
        requires: Vec<String>,
        /// Titles whose changes restart the stack.
        subscribes: Vec<String>,
    },
}

impl Resource {
    /// Unique `Kind[name]` title.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::Group { name, .. } => format!("Group[{name}]"),
            Self::ContainerEngine { .. } => "ContainerEngine[docker]".into(),
            Self::ComposeTool { .. } => "ComposeTool[docker-compose]".into(),
            Self::Directory { path, .. } | Self::File { path, .. } | Self::Prerequisite { path } => {
                file_title(path)
            }
            Self::Compose { project, .. } => format!("Compose[{project}]"),
        }
    }
}

/// Title of a file or directory resource.
#[must_use]
pub fn file_title(path: &std::path::Path) -> String {
    format!("File[{}]", path.display())
}

/// Emits every resource of the deployment, in declaration order.
#[must_use]
pub fn plan_resources(
    params: &DeploymentParams,
    config: &ResolvedConfig,
    compose_text: &str,
    compose_digest: &Sha256Hash,
) -> Vec<Resource> {
    let mut resources = vec![
        Resource::Group {
            name: DOCKER_GROUP.into(),
            ensure: Ensure::Present,
        },
        Resource::ContainerEngine {
            log_driver: config.log_driver.clone(),
        },
        Resource::ComposeTool {
            ensure: Ensure::Present,
        },
        service_directory(config.install_dir.clone()),
        service_directory(params.ssl_dir()),
    ];

    if let Some(data_dir) = &config.data_dir {
        resources.push(service_directory(data_dir.clone()));
        for (service, _) in SERVICE_DATA_PATHS {
            resources.push(service_directory(service_data_dir(data_dir, service)));
        }
    }

    resources.extend(
        config
            .prerequisites
            .iter()
            .map(|path| Resource::Prerequisite { path: path.clone() }),
    );

    resources.push(Resource::File {
        path: config.compose_file.clone(),
        owner: COMPOSE_FILE_OWNER.into(),
        group: DOCKER_GROUP.into(),
        mode: COMPOSE_FILE_MODE.into(),
        content: compose_text.to_string(),
        digest: compose_digest.clone(),
    });

    let mut watched: Vec<String> = config.prerequisites.iter().map(|p| file_title(p)).collect();
    watched.push(file_title(&config.compose_file));
    resources.push(Resource::Compose {
        project: config.project_name.clone(),
        compose_files: vec![config.compose_file.clone()],
        requires: watched.clone(),
        subscribes: watched,
    });

    tracing::debug!(count = resources.len(), "planned resources");
    resources
}

fn service_directory(path: PathBuf) -> Resource {
    Resource::Directory {
        path,
        owner: SERVICE_UID.into(),
        group: SERVICE_UID.into(),
        mode: DIRECTORY_MODE.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PuppetIdentity;
    use crate::resolver::resolve;

    fn plan(params: &DeploymentParams) -> Vec<Resource> {
        let config = resolve(params, &PuppetIdentity::new("node.example")).expect("resolve");
        let digest = Sha256Hash::from_hex("0".repeat(64)).expect("digest");
        plan_resources(params, &config, "content", &digest)
    }

    #[test]
    fn default_resources() {
        let resources = plan(&DeploymentParams::new("data_entitlement.test.com"));
        let titles: Vec<String> = resources.iter().map(Resource::title).collect();
        assert_eq!(
            titles,
            [
                "Group[docker]",
                "ContainerEngine[docker]",
                "ComposeTool[docker-compose]",
                "File[/opt/puppetlabs/data_entitlement]",
                "File[/opt/puppetlabs/data_entitlement/ssl]",
                "File[/opt/puppetlabs/data_entitlement/docker-compose.yaml]",
                "Compose[data_entitlement]",
            ]
        );
    }

    #[test]
    fn directories_belong_to_service_user() {
        let resources = plan(&DeploymentParams::new("data_entitlement.test.com"));
        let dirs: Vec<&Resource> = resources
            .iter()
            .filter(|r| matches!(r, Resource::Directory { .. }))
            .collect();
        assert_eq!(dirs.len(), 2);
        for dir in dirs {
            assert!(matches!(
                dir,
                Resource::Directory { owner, group, .. } if owner == "11223" && group == "11223"
            ));
        }
    }

    #[test]
    fn data_dir_adds_service_directories() {
        let params = DeploymentParams {
            data_dir: Some("/srv/de".into()),
            ..DeploymentParams::new("data_entitlement.test.com")
        };
        let titles: Vec<String> = plan(&params).iter().map(Resource::title).collect();
        assert!(titles.contains(&"File[/srv/de]".to_string()));
        assert!(titles.contains(&"File[/srv/de/elasticsearch]".to_string()));
    }

    #[test]
    fn compose_requires_prerequisites_then_file() {
        let params = DeploymentParams {
            ui_use_tls: true,
            ui_key_file: Some("/tmp/ui-cert.key".into()),
            ui_cert_file: Some("/tmp/ui-cert.pem".into()),
            ..DeploymentParams::new("data_entitlement.test.com")
        };
        let resources = plan(&params);
        let compose = resources.last().expect("compose");
        let expected = [
            "File[/tmp/ui-cert.key]",
            "File[/tmp/ui-cert.pem]",
            "File[/opt/puppetlabs/data_entitlement/docker-compose.yaml]",
        ];
        assert!(matches!(
            compose,
            Resource::Compose { requires, subscribes, .. } if requires == &expected && subscribes == &expected
        ));
    }

    #[test]
    fn file_content_is_not_serialized() {
        let resources = plan(&DeploymentParams::new("data_entitlement.test.com"));
        let json = serde_json::to_string(&resources).expect("serialize");
        assert!(!json.contains("\"content\""), "got: {json}");
        assert!(json.contains("\"kind\":\"compose\""), "got: {json}");
    }
}
