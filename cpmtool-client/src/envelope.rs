//! The response shape shared by every endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{ok, error, ...}` as returned by the service.
///
/// `error` is a string message on most endpoints and an integer code on
/// `account_login`/`account_register`, so it is kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    /// Operation-specific fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Envelope {
    /// A failure envelope carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(Value::String(message.into())),
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// The integer `error` code, if the service sent one.
    #[must_use]
    pub fn error_code(&self) -> Option<i64> {
        self.error.as_ref().and_then(Value::as_i64)
    }

    /// The `error` message, if the service sent a string.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().and_then(Value::as_str)
    }

    /// An operation-specific field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Status code for login-style endpoints.
    ///
    /// The service's own integer code when present, otherwise `0` for a
    /// successful envelope and the generic failure code for anything else.
    #[must_use]
    pub fn status_code(&self) -> i64 {
        match (self.error_code(), self.ok) {
            (Some(code), _) => code,
            (None, true) => 0,
            (None, false) => crate::error::GENERIC_FAILURE_CODE,
        }
    }
}
