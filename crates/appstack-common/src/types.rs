//! Domain primitive types used across the appstack workspace.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// A string whose value must not reach logs or debug output.
///
/// `Debug`, `Display`, and `Serialize` print a placeholder; the value is only
/// reachable through [`Sensitive::expose`].
#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct Sensitive(String);

impl Sensitive {
    /// Wraps a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the wrapped value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when the wrapped value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sensitive([redacted])")
    }
}

impl fmt::Display for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

impl Serialize for Sensitive {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[redacted]")
    }
}

/// Fully qualified container image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Builds `repository/prefix+name:tag`.
    ///
    /// An empty repository drops the separator, and an empty prefix
    /// collapses to nothing.
    #[must_use]
    pub fn compose(repository: &str, prefix: &str, name: &str, tag: &str) -> Self {
        let repository = repository.trim_end_matches('/');
        if repository.is_empty() {
            Self(format!("{prefix}{name}:{tag}"))
        } else {
            Self(format!("{repository}/{prefix}{name}:{tag}"))
        }
    }

    /// Uses a complete reference verbatim.
    #[must_use]
    pub fn pinned(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SHA-256 digest of rendered content, used to detect changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Creates a hash from a hex-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid 64-character hex string.
    pub fn from_hex(hex: impl Into<String>) -> crate::error::Result<Self> {
        let hex = hex.into();
        if hex.len() != crate::constants::SHA256_HEX_LENGTH
            || !hex.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(crate::error::AppStackError::Config {
                message: format!("invalid SHA-256 hex string: {hex}"),
            });
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    /// Hex-encodes raw digest bytes.
    #[must_use]
    pub fn from_digest(bytes: &[u8]) -> Self {
        use std::fmt::Write as _;

        let mut hex = String::with_capacity(bytes.len() * 2);
        for b in bytes {
            let _ = write!(hex, "{b:02x}");
        }
        Self(hex)
    }

    /// Returns the hex-encoded hash string.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}

/// Desired presence of a managed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    /// The resource exists (any kind).
    Present,
    /// The resource exists and is a regular file.
    File,
    /// The resource exists and is a directory.
    Directory,
    /// The resource is removed.
    Absent,
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

/// Authentication mode protecting the query API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryAuth {
    /// No authentication.
    None,
    /// OpenID Connect bearer tokens.
    Oidc,
    /// Puppet Enterprise RBAC tokens.
    PeRbac,
    /// HTTP basic authentication with a single user.
    BasicAuth,
}

impl fmt::Display for QueryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Oidc => write!(f, "oidc"),
            Self::PeRbac => write!(f, "pe_rbac"),
            Self::BasicAuth => write!(f, "basic_auth"),
        }
    }
}
