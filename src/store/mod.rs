//! Secret store client.
//!
//! A narrow typed contract over a remote secret-management service:
//!
//! - `HttpSecretStore`: talks to a Vault-compatible HTTP API
//! - `MemoryStore`: in-process store with the same semantics, for tests and
//!   local development
//!
//! Credentials are passed explicitly to every data operation; no
//! implementation keeps a mutable "current token".

mod error;
mod http;
mod memory;
mod types;

pub use error::{Result, StoreError};
pub use http::HttpSecretStore;
pub use memory::{CallCounts, MemoryStore};
pub use types::{redact_secret, AccessToken, RootCredential, SealState, SecretRecord, UnsealKey};

use async_trait::async_trait;

/// Operations the bootstrap controller and gateway need from a secret store.
///
/// Implementations must be safe for concurrent use.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Query whether the store has been initialized. Never mutates.
    async fn is_initialized(&self) -> Result<bool>;

    /// Create the root credential.
    ///
    /// Fails with `AlreadyInitialized` on an initialized store and with
    /// `InvalidArgument` unless `1 <= threshold <= share_count`.
    async fn initialize(&self, share_count: u8, threshold: u8) -> Result<RootCredential>;

    /// Submit one key share. Returns the resulting seal state; idempotent
    /// when already unsealed.
    async fn unseal(&self, share: &UnsealKey) -> Result<SealState>;

    /// Current seal state.
    async fn seal_status(&self) -> Result<SealState>;

    /// Overwrite the record at `path`.
    async fn write(&self, token: &AccessToken, path: &str, record: &SecretRecord) -> Result<()>;

    /// Read the record at `path`.
    async fn read(&self, token: &AccessToken, path: &str) -> Result<SecretRecord>;

    /// Display name for logging.
    fn name(&self) -> &str;
}

/// Check a share/threshold pair before it reaches the store.
pub(crate) fn validate_share_config(share_count: u8, threshold: u8) -> Result<()> {
    if share_count == 0 || threshold == 0 {
        return Err(StoreError::InvalidArgument(
            "share count and threshold must be at least 1".to_string(),
        ));
    }
    if threshold > share_count {
        return Err(StoreError::InvalidArgument(format!(
            "threshold {threshold} exceeds share count {share_count}"
        )));
    }
    Ok(())
}
