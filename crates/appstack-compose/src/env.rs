//! Environment variable entries of a compose service.

use std::fmt;

use appstack_common::types::Sensitive;
use serde::{Serialize, Serializer};

/// Value of an environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    /// Written verbatim.
    Plain(String),
    /// Written with compose interpolation escaped; redacted everywhere else.
    Secret(Sensitive),
}

/// One `KEY=value` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    /// Variable name.
    pub key: String,
    /// Variable value.
    pub value: EnvValue,
}

impl EnvVar {
    /// Creates a plain entry.
    #[must_use]
    pub fn plain(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: EnvValue::Plain(value.into()),
        }
    }

    /// Creates a secret entry.
    #[must_use]
    pub fn secret(key: impl Into<String>, value: Sensitive) -> Self {
        Self {
            key: key.into(),
            value: EnvValue::Secret(value),
        }
    }

    /// Returns the `KEY=value` line as it is written to the compose file.
    ///
    /// Secret values have every `$` doubled so compose does not treat
    /// them as variable references.
    #[must_use]
    pub fn assignment(&self) -> String {
        match &self.value {
            EnvValue::Plain(v) => format!("{}={v}", self.key),
            EnvValue::Secret(s) => format!("{}={}", self.key, escape_dollars(s.expose())),
        }
    }

    /// Returns the plain value, or `None` for secrets.
    #[must_use]
    pub fn plain_value(&self) -> Option<&str> {
        match &self.value {
            EnvValue::Plain(v) => Some(v),
            EnvValue::Secret(_) => None,
        }
    }
}

/// Redacted form, safe for logs and plan output.
impl fmt::Display for EnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            EnvValue::Plain(v) => write!(f, "{}={v}", self.key),
            EnvValue::Secret(s) => write!(f, "{}={s}", self.key),
        }
    }
}

impl Serialize for EnvVar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Doubles every `$` so compose interpolation yields the literal value.
#[must_use]
pub fn escape_dollars(value: &str) -> String {
    value.replace('$', "$$")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_assignment_is_verbatim() {
        let var = EnvVar::plain("HDP_ADMIN_ACCESS_LOG_LEVEL", "admin");
        assert_eq!(var.assignment(), "HDP_ADMIN_ACCESS_LOG_LEVEL=admin");
        assert_eq!(var.plain_value(), Some("admin"));
    }

    #[test]
    fn secret_assignment_escapes_dollars() {
        let var = EnvVar::secret("HDP_HTTP_QUERY_PASSWORD", Sensitive::new("$6$foo$bar"));
        assert_eq!(var.assignment(), "HDP_HTTP_QUERY_PASSWORD=$$6$$foo$$bar");
        assert_eq!(var.plain_value(), None);
    }

    #[test]
    fn secret_is_redacted_in_display_and_json() {
        let var = EnvVar::secret("HDP_HTTP_QUERY_PASSWORD", Sensitive::new("admin-password"));
        assert!(!var.to_string().contains("admin-password"));
        let json = serde_json::to_string(&var).expect("serialize");
        assert!(!json.contains("admin-password"), "got: {json}");
        assert!(json.contains("HDP_HTTP_QUERY_PASSWORD="), "got: {json}");
    }

    #[test]
    fn escape_dollars_leaves_other_text() {
        assert_eq!(escape_dollars("no dollars"), "no dollars");
        assert_eq!(escape_dollars("$$"), "$$$$");
    }
}
