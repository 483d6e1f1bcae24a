//! Parameter validation.
//!
//! The resolver is permissive: the only combination it rejects is disabled
//! trust-on-first-use without the full upload certificate set. Everything
//! else falls back to a default.

use std::path::{Path, PathBuf};

use appstack_common::config::DeploymentParams;
use appstack_common::error::{AppStackError, Result};

/// Certificate set presented by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCerts {
    /// CA used to verify clients.
    pub ca_cert_file: PathBuf,
    /// Server certificate.
    pub cert_file: PathBuf,
    /// Server private key.
    pub key_file: PathBuf,
}

/// Parameters that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedParams<'a> {
    params: &'a DeploymentParams,
    upload_certs: Option<UploadCerts>,
}

impl<'a> ValidatedParams<'a> {
    /// The underlying parameters.
    #[must_use]
    pub const fn params(&self) -> &'a DeploymentParams {
        self.params
    }

    /// The upload certificate set, when all three files were given.
    #[must_use]
    pub const fn upload_certs(&self) -> Option<&UploadCerts> {
        self.upload_certs.as_ref()
    }
}

/// Validates deployment parameters.
///
/// # Errors
///
/// Returns [`AppStackError::MissingCertConfig`] when
/// `allow_trust_on_first_use` is false and any of `ca_cert_file`,
/// `cert_file` or `key_file` is unset, and [`AppStackError::Config`] when
/// `dns_name` is empty.
pub fn validate(params: &DeploymentParams) -> Result<ValidatedParams<'_>> {
    tracing::info!(dns_name = %params.dns_name, "validating deployment parameters");

    if params.dns_name.trim().is_empty() {
        return Err(AppStackError::Config {
            message: "dns_name must not be empty".into(),
        });
    }
    if params.dns_name.chars().any(char::is_control) {
        return Err(AppStackError::Config {
            message: "dns_name must not contain control characters".into(),
        });
    }

    let ca = non_empty_path(params.ca_cert_file.as_ref());
    let cert = non_empty_path(params.cert_file.as_ref());
    let key = non_empty_path(params.key_file.as_ref());

    let upload_certs = match (ca, cert, key) {
        (Some(ca), Some(cert), Some(key)) => Some(UploadCerts {
            ca_cert_file: ca.to_path_buf(),
            cert_file: cert.to_path_buf(),
            key_file: key.to_path_buf(),
        }),
        _ if !params.allow_trust_on_first_use => {
            let missing: Vec<&'static str> = [
                ("ca_cert_file", ca.is_none()),
                ("cert_file", cert.is_none()),
                ("key_file", key.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            return Err(AppStackError::MissingCertConfig { missing });
        }
        (None, None, None) => None,
        _ => {
            tracing::warn!("incomplete upload certificate set ignored while trust-on-first-use is allowed");
            None
        }
    };

    Ok(ValidatedParams {
        params,
        upload_certs,
    })
}

/// Treats an empty path the same as an absent one.
pub(crate) fn non_empty_path(path: Option<&PathBuf>) -> Option<&Path> {
    path.map(PathBuf::as_path)
        .filter(|p| !p.as_os_str().is_empty())
}

/// Treats an empty or blank string the same as an absent one.
pub(crate) fn non_empty_str(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}
