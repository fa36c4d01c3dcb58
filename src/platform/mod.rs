//! Deployment-platform identity and namespace derivation.
//!
//! On Cloud Foundry the application identity arrives as JSON in the
//! `VCAP_APPLICATION` environment variable.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Environment variable carrying the Cloud Foundry application identity.
pub const VCAP_APPLICATION_ENV: &str = "VCAP_APPLICATION";

/// Namespace used when no platform identity is available.
pub const FALLBACK_NAMESPACE: &str = "secret/vaultgate-demo";

/// The subset of the platform identity the namespace is built from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppIdentity {
    pub application_id: String,
    pub application_name: String,
}

impl AppIdentity {
    /// Parse a `VCAP_APPLICATION` payload. Returns `None` on malformed JSON
    /// or when either field is missing or empty.
    pub fn from_vcap_json(raw: &str) -> Option<Self> {
        match serde_json::from_str::<AppIdentity>(raw) {
            Ok(identity)
                if !identity.application_id.is_empty()
                    && !identity.application_name.is_empty() =>
            {
                Some(identity)
            }
            Ok(_) => {
                warn!("{VCAP_APPLICATION_ENV} has empty application id or name");
                None
            }
            Err(e) => {
                warn!("Ignoring malformed {VCAP_APPLICATION_ENV}: {e}");
                None
            }
        }
    }

    pub fn from_env() -> Option<Self> {
        std::env::var(VCAP_APPLICATION_ENV)
            .ok()
            .and_then(|raw| Self::from_vcap_json(&raw))
    }

    pub fn namespace(&self) -> String {
        format!(
            "cf/{}/secret/{}",
            self.application_id, self.application_name
        )
    }
}

/// Path-like location of the secret record. Fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Build a namespace, trimming surrounding slashes. Empty paths are
    /// rejected.
    pub fn new(path: &str) -> Option<Self> {
        let trimmed = path.trim().trim_matches('/');
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Pick the namespace: explicit override, then platform identity, then
    /// the fixed fallback.
    pub fn resolve(override_path: Option<&str>, identity: Option<&AppIdentity>) -> Self {
        if let Some(ns) = override_path.and_then(Namespace::new) {
            debug!(namespace = %ns, "Using configured namespace");
            return ns;
        }
        if let Some(ns) = identity.and_then(|id| Namespace::new(&id.namespace())) {
            debug!(namespace = %ns, "Derived namespace from platform identity");
            return ns;
        }
        Self(FALLBACK_NAMESPACE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
