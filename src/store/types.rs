//! Core types shared by every secret store implementation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Credentials
// ============================================================================

/// An opaque store credential.
///
/// `Debug` and `Display` print a redacted form; the raw value is only
/// reachable through [`AccessToken::expose`].
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn redacted(&self) -> String {
        if self.0.is_empty() {
            return "<empty>".to_string();
        }
        redact_secret(&self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({})", self.redacted())
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// One unseal key share, hex encoded as the store hands it out.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnsealKey(String);

impl UnsealKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UnsealKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnsealKey({})", redact_secret(&self.0))
    }
}

/// The root token and key shares produced by initialization.
///
/// Held only in memory for the duration of a bootstrap run.
#[derive(Debug, Clone)]
pub struct RootCredential {
    pub root_token: AccessToken,
    pub key_shares: Vec<UnsealKey>,
}

impl RootCredential {
    pub fn first_share(&self) -> Option<&UnsealKey> {
        self.key_shares.first()
    }
}

// ============================================================================
// Seal state
// ============================================================================

/// Cryptographic state of the remote store. Always queried fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SealState {
    Uninitialized,
    Sealed,
    Unsealed,
}

impl fmt::Display for SealState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SealState::Uninitialized => "uninitialized",
            SealState::Sealed => "sealed",
            SealState::Unsealed => "unsealed",
        };
        f.write_str(label)
    }
}

// ============================================================================
// Secret record
// ============================================================================

/// Field name to value mapping stored at a namespace.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretRecord(BTreeMap<String, serde_json::Value>);

impl SecretRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record holding only a `message` field.
    pub fn with_message(message: impl Into<String>) -> Self {
        let mut record = Self::new();
        record.insert("message", serde_json::Value::String(message.into()));
        record
    }

    pub fn insert(&mut self, field: impl Into<String>, value: serde_json::Value) {
        self.0.insert(field.into(), value);
    }

    /// Render a field as plain text: strings verbatim, anything else as JSON.
    pub fn field_text(&self, field: &str) -> Option<String> {
        self.0.get(field).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, serde_json::Value>> for SecretRecord {
    fn from(fields: BTreeMap<String, serde_json::Value>) -> Self {
        Self(fields)
    }
}

/// Redact a secret value for display (show first 2 and last 2 chars).
pub fn redact_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 6 {
        return "***".to_string();
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}…{tail}")
}
