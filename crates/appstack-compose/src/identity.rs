//! Node identity: the host's own certificate and key.
//!
//! When the UI serves TLS without explicitly configured files, the stack
//! reuses the configuration-management agent's certificate for this node.

use std::path::{Path, PathBuf};

use appstack_common::constants::DEFAULT_AGENT_SSL_DIR;

/// Source of this host's certificate/key pair.
pub trait NodeIdentity {
    /// Certificate name of this node.
    fn certname(&self) -> &str;

    /// Root of the agent's SSL store.
    fn ssl_dir(&self) -> &Path;

    /// Private key of this node.
    fn key_path(&self) -> PathBuf {
        self.ssl_dir()
            .join("private_keys")
            .join(format!("{}.pem", self.certname()))
    }

    /// Certificate of this node.
    fn cert_path(&self) -> PathBuf {
        self.ssl_dir()
            .join("certs")
            .join(format!("{}.pem", self.certname()))
    }
}

/// Node identity backed by a Puppet agent SSL directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuppetIdentity {
    certname: String,
    ssl_dir: PathBuf,
}

impl PuppetIdentity {
    /// Identity for `certname` in the default agent SSL directory.
    #[must_use]
    pub fn new(certname: impl Into<String>) -> Self {
        Self {
            certname: certname.into(),
            ssl_dir: PathBuf::from(DEFAULT_AGENT_SSL_DIR),
        }
    }

    /// Uses a different SSL directory.
    #[must_use]
    pub fn with_ssl_dir(mut self, ssl_dir: impl Into<PathBuf>) -> Self {
        self.ssl_dir = ssl_dir.into();
        self
    }
}

impl NodeIdentity for PuppetIdentity {
    fn certname(&self) -> &str {
        &self.certname
    }

    fn ssl_dir(&self) -> &Path {
        &self.ssl_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_store_layout() {
        let id = PuppetIdentity::new("true.data_entitlement");
        assert_eq!(
            id.key_path(),
            PathBuf::from("/etc/puppetlabs/puppet/ssl/private_keys/true.data_entitlement.pem")
        );
        assert_eq!(
            id.cert_path(),
            PathBuf::from("/etc/puppetlabs/puppet/ssl/certs/true.data_entitlement.pem")
        );
    }

    #[test]
    fn custom_ssl_dir() {
        let id = PuppetIdentity::new("node.example").with_ssl_dir("/var/ssl");
        assert_eq!(id.ssl_dir(), Path::new("/var/ssl"));
        assert_eq!(id.cert_path(), PathBuf::from("/var/ssl/certs/node.example.pem"));
    }
}
