//! Parameter resolution.
//!
//! Turns validated [`DeploymentParams`] into a [`ResolvedConfig`]: image
//! references, per-service environment, mounts, ports, and the files the
//! compose action depends on.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use appstack_common::config::DeploymentParams;
use appstack_common::constants::{
    DATA_ENTITLEMENT_IMAGE_NAME, FRONTEND_IMAGE_NAME, UI_IMAGE_NAME,
};
use appstack_common::error::Result;
use appstack_common::types::{ImageRef, QueryAuth};

use crate::auth::resolve_auth_env;
use crate::env::EnvVar;
use crate::identity::NodeIdentity;
use crate::tls::{UiTls, read_only_mount, resolve_tls_paths};
use crate::validator::{ValidatedParams, non_empty_str, validate};
use crate::versions::resolve_versions;

/// Data-bearing infrastructure services and their in-container data path.
pub const SERVICE_DATA_PATHS: [(&str, &str); 3] = [
    ("redis", "/data"),
    ("elasticsearch", "/usr/share/elasticsearch/data"),
    ("minio", "/data"),
];

/// Image references of every service in the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceImages {
    /// Ingestion and query backend.
    pub data_entitlement: ImageRef,
    /// TLS-terminating UI proxy.
    pub ui: ImageRef,
    /// Browser frontend.
    pub frontend: ImageRef,
    /// Job queue.
    pub redis: ImageRef,
    /// Search index.
    pub elasticsearch: ImageRef,
    /// Object storage.
    pub minio: ImageRef,
}

/// Fully resolved stack configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Compose project name.
    pub project_name: String,
    /// Public DNS name.
    pub dns_name: String,
    /// Directory holding the compose file.
    pub install_dir: PathBuf,
    /// Path of the rendered compose file.
    pub compose_file: PathBuf,
    /// Image references.
    pub images: ServiceImages,
    /// Port mappings of the UI service.
    pub ui_ports: Vec<String>,
    /// Port mappings of the backend service.
    pub backend_ports: Vec<String>,
    /// UI TLS files, when TLS is enabled.
    pub ui_tls: Option<UiTls>,
    /// Query auth mode in effect.
    pub auth_mode: QueryAuth,
    /// Backend environment, in render order.
    pub backend_env: Vec<EnvVar>,
    /// Frontend environment, in render order.
    pub frontend_env: Vec<EnvVar>,
    /// Read-only file mounts of the backend.
    pub backend_mounts: Vec<String>,
    /// Static host entries of the backend.
    pub extra_hosts: BTreeMap<String, String>,
    /// Host directory for service data; named volumes when unset.
    pub data_dir: Option<PathBuf>,
    /// Docker engine log driver.
    pub log_driver: String,
    /// Files the compose action requires and subscribes to, in order.
    pub prerequisites: Vec<PathBuf>,
}

impl ResolvedConfig {
    /// Volume mounts of the UI service.
    #[must_use]
    pub fn ui_mounts(&self) -> Vec<String> {
        self.ui_tls.as_ref().map(UiTls::mounts).unwrap_or_default()
    }
}

/// Validates and resolves deployment parameters.
///
/// # Errors
///
/// Returns an error if validation fails; no partial configuration is
/// produced in that case.
pub fn resolve(params: &DeploymentParams, identity: &dyn NodeIdentity) -> Result<ResolvedConfig> {
    let validated = validate(params)?;
    Ok(resolve_validated(&validated, identity))
}

/// Resolves parameters that already passed validation.
#[must_use]
pub fn resolve_validated(validated: &ValidatedParams<'_>, identity: &dyn NodeIdentity) -> ResolvedConfig {
    let params = validated.params();
    tracing::info!(
        dns_name = %params.dns_name,
        project = %params.project_name,
        "resolving stack configuration"
    );

    let images = resolve_images(params);
    let ui_tls = resolve_tls_paths(params, identity);
    let auth = resolve_auth_env(params);

    let mut ui_ports = vec![port_mapping(80)];
    if ui_tls.is_some() {
        ui_ports.push(port_mapping(443));
    }

    let mut backend_env = vec![
        EnvVar::plain("HDP_NAME", params.dns_name.as_str()),
        EnvVar::plain("HDP_BACKENDS_REDIS_ADDR", "redis:6379"),
        EnvVar::plain("HDP_BACKENDS_ES_HOST", "http://elasticsearch:9200"),
        EnvVar::plain("HDP_BACKENDS_S3_ENDPOINT", "http://minio:9000"),
        EnvVar::plain("HDP_ADMIN_ACCESS_LOG_LEVEL", params.access_log_level.as_str()),
    ];
    if let Some(namespace) = non_empty_str(params.prometheus_namespace.as_ref()) {
        backend_env.push(EnvVar::plain("HDP_ADMIN_PROMETHEUS_NAMESPACE", namespace));
    }
    if let Some(url) = non_empty_str(params.dashboard_url.as_ref()) {
        backend_env.push(EnvVar::plain("HDP_JOBS_DASHBOARD_URL", url));
    }

    let mut backend_mounts = Vec::new();
    if let Some(certs) = validated.upload_certs() {
        for (key, path) in [
            ("HDP_HTTP_UPLOAD_CACERTFILE", &certs.ca_cert_file),
            ("HDP_HTTP_UPLOAD_CERTFILE", &certs.cert_file),
            ("HDP_HTTP_UPLOAD_KEYFILE", &certs.key_file),
        ] {
            backend_env.push(EnvVar::plain(key, path.display().to_string()));
            push_unique(&mut backend_mounts, read_only_mount(path, path));
        }
    }
    backend_env.extend(auth.backend);
    if let Some(ca) = &auth.ca_cert_file {
        push_unique(&mut backend_mounts, read_only_mount(ca, ca));
    }

    let prerequisites = ui_tls
        .as_ref()
        .map(|tls| tls.prerequisites.clone())
        .unwrap_or_default();

    ResolvedConfig {
        project_name: params.project_name.clone(),
        dns_name: params.dns_name.clone(),
        install_dir: params.install_dir.clone(),
        compose_file: params.compose_file(),
        images,
        ui_ports,
        backend_ports: vec![port_mapping(params.data_entitlement_port)],
        ui_tls,
        auth_mode: auth.mode,
        backend_env,
        frontend_env: auth.frontend,
        backend_mounts,
        extra_hosts: params.extra_hosts.clone(),
        data_dir: params.data_dir.clone(),
        log_driver: params.log_driver.clone(),
        prerequisites,
    }
}

fn resolve_images(params: &DeploymentParams) -> ServiceImages {
    let tags = resolve_versions(params);
    let app = |name: &str, tag: &str| {
        ImageRef::compose(&params.image_repository, &params.image_prefix, name, tag)
    };
    ServiceImages {
        data_entitlement: app(DATA_ENTITLEMENT_IMAGE_NAME, &tags.data_entitlement),
        ui: app(UI_IMAGE_NAME, &tags.ui),
        frontend: app(FRONTEND_IMAGE_NAME, &tags.frontend),
        redis: ImageRef::pinned(params.redis_image.as_str()),
        elasticsearch: ImageRef::pinned(params.elasticsearch_image.as_str()),
        minio: ImageRef::pinned(params.minio_image.as_str()),
    }
}

fn port_mapping(port: u16) -> String {
    format!("{port}:{port}")
}

fn push_unique(mounts: &mut Vec<String>, mount: String) {
    if !mounts.contains(&mount) {
        mounts.push(mount);
    }
}

/// Host directory of a service's data under `data_dir`.
#[must_use]
pub fn service_data_dir(data_dir: &Path, service: &str) -> PathBuf {
    data_dir.join(service)
}
