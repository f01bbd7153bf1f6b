//! Bearer credential.

use crate::error::{ClientError, Result};
use std::fmt;

/// Opaque bearer token proving the caller's identity.
///
/// Passed explicitly to every authenticated API call. `Debug` output never
/// contains the secret.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token.
    ///
    /// Surrounding whitespace (such as a newline left at the end of a token
    /// file) is stripped.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the token is empty.
    pub fn parse(raw: &str) -> Result<Self> {
        let token = raw.trim();
        if token.is_empty() {
            return Err(ClientError::Storage("empty token".to_string()));
        }
        Ok(Self(token.to_string()))
    }

    /// Wrap a token known to be non-empty.
    #[cfg(feature = "test-utils")]
    pub(crate) const fn from_issued(token: String) -> Self {
        Self(token)
    }

    /// The raw token, for persisting it.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }

    /// Value of the `Authorization` header.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_rejects_empty() {
        let credential = Credential::parse("  abc.def.ghi\n").unwrap();
        assert_eq!(credential.secret(), "abc.def.ghi");
        assert_eq!(credential.authorization_header(), "Bearer abc.def.ghi");

        assert!(Credential::parse(" \n").is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let credential = Credential::parse("super-secret").unwrap();
        let debug = format!("{credential:?}");
        assert!(!debug.contains("super-secret"));
    }
}
