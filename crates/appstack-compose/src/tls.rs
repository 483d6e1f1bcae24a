//! UI TLS material: where the key, certificate, and CA come from.

use std::path::{Path, PathBuf};

use appstack_common::config::DeploymentParams;
use appstack_common::constants::{UI_CA_MOUNT, UI_CERT_MOUNT, UI_KEY_MOUNT};

use crate::identity::NodeIdentity;
use crate::validator::non_empty_path;

/// Where the UI key and certificate were taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsSource {
    /// `ui_key_file` and `ui_cert_file` were given.
    Explicit,
    /// Synthesized from the node identity's certificate store.
    NodeIdentity,
}

/// Resolved UI TLS files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiTls {
    /// Host path of the private key.
    pub key: PathBuf,
    /// Host path of the certificate.
    pub cert: PathBuf,
    /// Host path of the CA bundle, if any.
    pub ca: Option<PathBuf>,
    /// Origin of `key` and `cert`.
    pub source: TlsSource,
    /// Files the compose action must wait on and watch.
    pub prerequisites: Vec<PathBuf>,
}

impl UiTls {
    /// Read-only volume mounts for the UI container.
    #[must_use]
    pub fn mounts(&self) -> Vec<String> {
        let mut mounts = vec![
            read_only_mount(&self.key, Path::new(UI_KEY_MOUNT)),
            read_only_mount(&self.cert, Path::new(UI_CERT_MOUNT)),
        ];
        if let Some(ca) = &self.ca {
            mounts.push(read_only_mount(ca, Path::new(UI_CA_MOUNT)));
        }
        mounts
    }
}

/// Formats a `host:container:ro` volume entry.
#[must_use]
pub fn read_only_mount(host: &Path, container: &Path) -> String {
    format!("{}:{}:ro", host.display(), container.display())
}

/// Resolves the UI TLS files.
///
/// Returns `None` when TLS is disabled. Explicit key and certificate files
/// are used verbatim; otherwise the node identity's pair is used. Given
/// files become prerequisites only when `ui_cert_files_puppet_managed` is
/// set, since only then are they managed resources to wait on. Nothing is
/// watched when the pair comes from the node identity, not even a given CA.
#[must_use]
pub fn resolve_tls_paths(params: &DeploymentParams, identity: &dyn NodeIdentity) -> Option<UiTls> {
    if !params.ui_use_tls {
        tracing::debug!("UI TLS disabled");
        return None;
    }

    let managed = params.ui_cert_files_puppet_managed;
    let ca = non_empty_path(params.ui_ca_cert_file.as_ref()).map(Path::to_path_buf);
    let explicit = non_empty_path(params.ui_key_file.as_ref())
        .zip(non_empty_path(params.ui_cert_file.as_ref()));

    let tls = if let Some((key, cert)) = explicit {
        let mut prerequisites = Vec::new();
        if managed {
            prerequisites.extend(ca.iter().cloned());
            prerequisites.push(key.to_path_buf());
            prerequisites.push(cert.to_path_buf());
        }
        UiTls {
            key: key.to_path_buf(),
            cert: cert.to_path_buf(),
            ca,
            source: TlsSource::Explicit,
            prerequisites,
        }
    } else {
        if params.ui_key_file.is_some() != params.ui_cert_file.is_some() {
            tracing::warn!("only one of ui_key_file and ui_cert_file given; using node identity");
        }
        UiTls {
            key: identity.key_path(),
            cert: identity.cert_path(),
            ca,
            source: TlsSource::NodeIdentity,
            prerequisites: Vec::new(),
        }
    };

    tracing::debug!(
        key = %tls.key.display(),
        cert = %tls.cert.display(),
        source = ?tls.source,
        "resolved UI TLS files"
    );
    Some(tls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PuppetIdentity;

    fn tls_params() -> DeploymentParams {
        DeploymentParams {
            ui_use_tls: true,
            ..DeploymentParams::new("data_entitlement.test.com")
        }
    }

    #[test]
    fn disabled_yields_nothing() {
        let params = DeploymentParams::new("data_entitlement.test.com");
        let id = PuppetIdentity::new("node.example");
        assert!(resolve_tls_paths(&params, &id).is_none());
    }

    #[test]
    fn explicit_files_are_prerequisites() {
        let params = DeploymentParams {
            ui_key_file: Some("/tmp/ui-cert.key".into()),
            ui_cert_file: Some("/tmp/ui-cert.pem".into()),
            ui_ca_cert_file: Some("/tmp/ui-ca.pem".into()),
            ..tls_params()
        };
        let id = PuppetIdentity::new("node.example");
        let tls = resolve_tls_paths(&params, &id).expect("tls");
        assert_eq!(tls.source, TlsSource::Explicit);
        assert_eq!(
            tls.prerequisites,
            vec![
                PathBuf::from("/tmp/ui-ca.pem"),
                PathBuf::from("/tmp/ui-cert.key"),
                PathBuf::from("/tmp/ui-cert.pem"),
            ]
        );
        assert_eq!(
            tls.mounts(),
            vec![
                "/tmp/ui-cert.key:/etc/ssl/key.pem:ro",
                "/tmp/ui-cert.pem:/etc/ssl/cert.pem:ro",
                "/tmp/ui-ca.pem:/etc/ssl/ca.pem:ro",
            ]
        );
    }

    #[test]
    fn default_files_come_from_node_identity() {
        let id = PuppetIdentity::new("data_entitlement.example");
        let tls = resolve_tls_paths(&tls_params(), &id).expect("tls");
        assert_eq!(tls.source, TlsSource::NodeIdentity);
        assert!(tls.prerequisites.is_empty());
        assert!(tls.key.to_string_lossy().contains("data_entitlement.example"));
        assert!(tls.cert.to_string_lossy().contains("data_entitlement.example"));
    }

    #[test]
    fn unmanaged_ca_is_mounted_but_not_watched() {
        let params = DeploymentParams {
            ui_cert_files_puppet_managed: false,
            ui_ca_cert_file: Some("/tmp/ui-ca.pem".into()),
            ..tls_params()
        };
        let id = PuppetIdentity::new("true.data_entitlement");
        let tls = resolve_tls_paths(&params, &id).expect("tls");
        assert!(tls.prerequisites.is_empty());
        assert_eq!(tls.ca, Some(PathBuf::from("/tmp/ui-ca.pem")));
        assert_eq!(
            tls.key,
            PathBuf::from("/etc/puppetlabs/puppet/ssl/private_keys/true.data_entitlement.pem")
        );
    }

    #[test]
    fn lone_key_file_falls_back_to_identity() {
        let params = DeploymentParams {
            ui_key_file: Some("/tmp/ui-cert.key".into()),
            ..tls_params()
        };
        let id = PuppetIdentity::new("node.example");
        let tls = resolve_tls_paths(&params, &id).expect("tls");
        assert_eq!(tls.source, TlsSource::NodeIdentity);
    }

    #[test]
    fn identity_pair_watches_no_ca() {
        let params = DeploymentParams {
            ui_ca_cert_file: Some("/tmp/ui-ca.pem".into()),
            ..tls_params()
        };
        let id = PuppetIdentity::new("node.example");
        let tls = resolve_tls_paths(&params, &id).expect("tls");
        assert_eq!(tls.source, TlsSource::NodeIdentity);
        assert!(tls.prerequisites.is_empty());
        assert_eq!(tls.ca, Some(PathBuf::from("/tmp/ui-ca.pem")));
    }
}
