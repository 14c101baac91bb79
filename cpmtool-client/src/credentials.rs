//! Credentials the client carries: the access key given at construction and
//! the auth token issued by the service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Credential identifying the licensed application. Fixed for the
/// client's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessKey(String);

impl AccessKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccessKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for AccessKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Session token issued by a successful login or registration.
///
/// Held in memory only. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(..)")
    }
}
