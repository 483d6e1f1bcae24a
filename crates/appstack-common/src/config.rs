//! Deployment parameters: the single input record of the resolver.
//!
//! Parameters are usually read from a YAML document. Every field except
//! `dns_name` is optional and falls back to the defaults in
//! [`crate::constants`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{AppStackError, Result};
use crate::types::{QueryAuth, Sensitive};

/// Desired state of one host's application stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentParams {
    /// Public DNS name the stack is reachable under.
    pub dns_name: String,
    /// Directory holding the compose file and SSL material.
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,
    /// Compose project name.
    #[serde(default = "default_project_name")]
    pub project_name: String,

    /// Serve the UI over HTTPS on port 443.
    #[serde(default)]
    pub ui_use_tls: bool,
    /// Whether the UI certificate files are managed resources the stack waits on.
    #[serde(default = "default_true")]
    pub ui_cert_files_puppet_managed: bool,
    /// UI private key.
    #[serde(default)]
    pub ui_key_file: Option<PathBuf>,
    /// UI certificate.
    #[serde(default)]
    pub ui_cert_file: Option<PathBuf>,
    /// CA bundle served alongside the UI certificate.
    #[serde(default)]
    pub ui_ca_cert_file: Option<PathBuf>,

    /// Accept upload client certificates on first contact.
    #[serde(default = "default_true")]
    pub allow_trust_on_first_use: bool,
    /// CA used to verify upload clients.
    #[serde(default)]
    pub ca_cert_file: Option<PathBuf>,
    /// Certificate presented by the upload endpoint.
    #[serde(default)]
    pub cert_file: Option<PathBuf>,
    /// Private key of the upload endpoint.
    #[serde(default)]
    pub key_file: Option<PathBuf>,

    /// Global image tag.
    #[serde(default)]
    pub version: Option<String>,
    /// Tag of the backend image; also the fallback for the UI images.
    #[serde(default)]
    pub data_entitlement_version: Option<String>,
    /// Tag of the UI proxy image.
    #[serde(default)]
    pub ui_version: Option<String>,
    /// Tag of the frontend image.
    #[serde(default)]
    pub frontend_version: Option<String>,
    /// Registry and namespace of the application images.
    #[serde(default = "default_image_repository")]
    pub image_repository: String,
    /// Prefix prepended to every application image name.
    #[serde(default)]
    pub image_prefix: String,
    /// Redis image reference.
    #[serde(default = "default_redis_image")]
    pub redis_image: String,
    /// Elasticsearch image reference.
    #[serde(default = "default_elasticsearch_image")]
    pub elasticsearch_image: String,
    /// MinIO image reference.
    #[serde(default = "default_minio_image")]
    pub minio_image: String,

    /// Namespace for exported Prometheus metrics.
    #[serde(default)]
    pub prometheus_namespace: Option<String>,
    /// Access log level of the admin endpoints.
    #[serde(default = "default_access_log_level")]
    pub access_log_level: String,
    /// Static hostname to IP mappings for the backend.
    #[serde(default)]
    pub extra_hosts: BTreeMap<String, String>,

    /// Query API authentication mode.
    #[serde(default)]
    pub data_entitlement_query_auth: Option<QueryAuth>,
    /// Basic auth user.
    #[serde(default)]
    pub data_entitlement_query_username: Option<String>,
    /// Basic auth password.
    #[serde(default)]
    pub data_entitlement_query_password: Option<Sensitive>,
    /// OIDC issuer URL.
    #[serde(default)]
    pub data_entitlement_query_oidc_issuer: Option<String>,
    /// OIDC client id.
    #[serde(default)]
    pub data_entitlement_query_oidc_client_id: Option<String>,
    /// PE RBAC service URL.
    #[serde(default)]
    pub data_entitlement_query_pe_rbac_service: Option<String>,
    /// PE RBAC role granted query access.
    #[serde(default = "default_pe_rbac_role_id")]
    pub data_entitlement_query_pe_rbac_role_id: u32,
    /// CA bundle for the PE RBAC service, or `-` for the system trust store.
    #[serde(default)]
    pub data_entitlement_query_pe_rbac_ca_cert_file: Option<String>,

    /// Link shown on job reports.
    #[serde(default)]
    pub dashboard_url: Option<String>,
    /// Host directory for service data; named volumes are used when unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Port the backend accepts uploads on.
    #[serde(default = "default_data_entitlement_port")]
    pub data_entitlement_port: u16,
    /// Docker engine log driver.
    #[serde(default = "default_log_driver")]
    pub log_driver: String,
}

fn default_install_dir() -> PathBuf {
    PathBuf::from(constants::DEFAULT_INSTALL_DIR)
}

fn default_project_name() -> String {
    constants::DEFAULT_PROJECT_NAME.into()
}

const fn default_true() -> bool {
    true
}

fn default_image_repository() -> String {
    constants::DEFAULT_IMAGE_REPOSITORY.into()
}

fn default_redis_image() -> String {
    constants::DEFAULT_REDIS_IMAGE.into()
}

fn default_elasticsearch_image() -> String {
    constants::DEFAULT_ELASTICSEARCH_IMAGE.into()
}

fn default_minio_image() -> String {
    constants::DEFAULT_MINIO_IMAGE.into()
}

fn default_access_log_level() -> String {
    constants::DEFAULT_ACCESS_LOG_LEVEL.into()
}

const fn default_pe_rbac_role_id() -> u32 {
    constants::DEFAULT_PE_RBAC_ROLE_ID
}

const fn default_data_entitlement_port() -> u16 {
    constants::DEFAULT_DATA_ENTITLEMENT_PORT
}

fn default_log_driver() -> String {
    constants::DEFAULT_LOG_DRIVER.into()
}

impl DeploymentParams {
    /// Creates parameters for `dns_name` with every other field defaulted.
    #[must_use]
    pub fn new(dns_name: impl Into<String>) -> Self {
        Self {
            dns_name: dns_name.into(),
            install_dir: default_install_dir(),
            project_name: default_project_name(),
            ui_use_tls: false,
            ui_cert_files_puppet_managed: true,
            ui_key_file: None,
            ui_cert_file: None,
            ui_ca_cert_file: None,
            allow_trust_on_first_use: true,
            ca_cert_file: None,
            cert_file: None,
            key_file: None,
            version: None,
            data_entitlement_version: None,
            ui_version: None,
            frontend_version: None,
            image_repository: default_image_repository(),
            image_prefix: String::new(),
            redis_image: default_redis_image(),
            elasticsearch_image: default_elasticsearch_image(),
            minio_image: default_minio_image(),
            prometheus_namespace: None,
            access_log_level: default_access_log_level(),
            extra_hosts: BTreeMap::new(),
            data_entitlement_query_auth: None,
            data_entitlement_query_username: None,
            data_entitlement_query_password: None,
            data_entitlement_query_oidc_issuer: None,
            data_entitlement_query_oidc_client_id: None,
            data_entitlement_query_pe_rbac_service: None,
            data_entitlement_query_pe_rbac_role_id: default_pe_rbac_role_id(),
            data_entitlement_query_pe_rbac_ca_cert_file: None,
            dashboard_url: None,
            data_dir: None,
            data_entitlement_port: default_data_entitlement_port(),
            log_driver: default_log_driver(),
        }
    }

    /// Parses parameters from a YAML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid YAML, lacks `dns_name`,
    /// or contains unknown keys.
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Reads and parses a YAML parameters file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading deployment parameters");
        let content = std::fs::read_to_string(path).map_err(|e| AppStackError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Path of the rendered compose file.
    #[must_use]
    pub fn compose_file(&self) -> PathBuf {
        self.install_dir.join(constants::COMPOSE_FILE_NAME)
    }

    /// Path of the stack's SSL directory.
    #[must_use]
    pub fn ssl_dir(&self) -> PathBuf {
        self.install_dir.join(constants::SSL_SUBDIR)
    }
}
