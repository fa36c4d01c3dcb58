//! Vault-compatible HTTP client.

use super::{
    validate_share_config, AccessToken, Result, RootCredential, SealState, SecretRecord,
    SecretStore, StoreError, UnsealKey,
};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const API_VERSION: &str = "v1";
const TOKEN_HEADER: &str = "X-Vault-Token";

/// Secret store reached over the Vault HTTP API.
pub struct HttpSecretStore {
    base_url: String,
    client: Client,
}

impl HttpSecretStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| StoreError::InvalidArgument(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            API_VERSION,
            path.trim_start_matches('/')
        )
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct InitStatusResponse {
    initialized: bool,
}

#[derive(Debug, Serialize)]
struct InitRequest {
    secret_shares: u8,
    secret_threshold: u8,
}

#[derive(Debug, Deserialize)]
struct InitResponse {
    keys: Vec<String>,
    root_token: String,
}

#[derive(Debug, Serialize)]
struct UnsealRequest<'a> {
    key: &'a str,
}

#[derive(Debug, Deserialize)]
struct SealStatusResponse {
    sealed: bool,
    #[serde(default = "default_true")]
    initialized: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    #[serde(default)]
    data: Option<SecretRecord>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

impl SealStatusResponse {
    fn state(&self) -> SealState {
        if !self.initialized {
            SealState::Uninitialized
        } else if self.sealed {
            SealState::Sealed
        } else {
            SealState::Unsealed
        }
    }
}

// ============================================================================
// Error mapping
// ============================================================================

/// Collapse a non-success response into a `StoreError`.
async fn error_from_response(resp: Response, path: &str) -> StoreError {
    let status = resp.status();
    classify_status(status, path, error_message(resp).await)
}

/// The joined `errors` list of an error body, or the raw text.
async fn error_message(resp: Response) -> String {
    let text = resp.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorResponse>(&text)
        .map(|body| body.errors.join("; "))
        .unwrap_or(text)
}

/// Only a rejected key is an invalid share; any other failed unseal (for
/// example on an uninitialized store) is classified like other calls.
fn classify_unseal(status: StatusCode, message: String) -> StoreError {
    let lower = message.to_lowercase();
    let rejected_key = lower.contains("invalid key")
        || lower.contains("unseal failed")
        || lower.contains("must be a valid hex or base64");
    if status == StatusCode::BAD_REQUEST && rejected_key {
        StoreError::InvalidShare(message)
    } else {
        classify_status(status, "sys/unseal", message)
    }
}

fn classify_status(status: StatusCode, path: &str, message: String) -> StoreError {
    match status {
        StatusCode::FORBIDDEN => StoreError::PermissionDenied {
            path: path.to_string(),
        },
        StatusCode::NOT_FOUND => StoreError::NotFound {
            path: path.to_string(),
        },
        StatusCode::SERVICE_UNAVAILABLE => StoreError::Sealed,
        StatusCode::BAD_REQUEST if message.to_lowercase().contains("already initialized") => {
            StoreError::AlreadyInitialized
        }
        _ => StoreError::UnexpectedResponse {
            status: status.as_u16(),
            message,
        },
    }
}

// ============================================================================
// SecretStore Implementation
// ============================================================================

#[async_trait]
impl SecretStore for HttpSecretStore {
    async fn is_initialized(&self) -> Result<bool> {
        let resp = self.client.get(self.url("sys/init")).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp, "sys/init").await);
        }
        let body: InitStatusResponse = resp.json().await?;
        debug!(initialized = body.initialized, "Queried init status");
        Ok(body.initialized)
    }

    async fn initialize(&self, share_count: u8, threshold: u8) -> Result<RootCredential> {
        validate_share_config(share_count, threshold)?;

        let resp = self
            .client
            .put(self.url("sys/init"))
            .json(&InitRequest {
                secret_shares: share_count,
                secret_threshold: threshold,
            })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp, "sys/init").await);
        }

        let body: InitResponse = resp.json().await?;
        if body.keys.is_empty() {
            return Err(StoreError::UnexpectedResponse {
                status: 200,
                message: "initialize returned no key shares".to_string(),
            });
        }

        Ok(RootCredential {
            root_token: AccessToken::new(body.root_token),
            key_shares: body.keys.into_iter().map(UnsealKey::new).collect(),
        })
    }

    async fn unseal(&self, share: &UnsealKey) -> Result<SealState> {
        let resp = self
            .client
            .put(self.url("sys/unseal"))
            .json(&UnsealRequest { key: share.expose() })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(classify_unseal(status, error_message(resp).await));
        }

        let body: SealStatusResponse = resp.json().await?;
        Ok(body.state())
    }

    async fn seal_status(&self) -> Result<SealState> {
        let resp = self.client.get(self.url("sys/seal-status")).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp, "sys/seal-status").await);
        }
        let body: SealStatusResponse = resp.json().await?;
        Ok(body.state())
    }

    async fn write(&self, token: &AccessToken, path: &str, record: &SecretRecord) -> Result<()> {
        let resp = self
            .client
            .put(self.url(path))
            .header(TOKEN_HEADER, token.expose())
            .json(record)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp, path).await);
        }
        debug!(path, fields = record.len(), "Wrote secret record");
        Ok(())
    }

    async fn read(&self, token: &AccessToken, path: &str) -> Result<SecretRecord> {
        let resp = self
            .client
            .get(self.url(path))
            .header(TOKEN_HEADER, token.expose())
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp, path).await);
        }

        let body: ReadResponse = resp.json().await?;
        body.data.ok_or_else(|| StoreError::NotFound {
            path: path.to_string(),
        })
    }

    fn name(&self) -> &str {
        "vault-http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slashes() {
        let store = HttpSecretStore::new("http://127.0.0.1:8200/", Duration::from_secs(1)).unwrap();
        assert_eq!(store.url("/secret/app"), "http://127.0.0.1:8200/v1/secret/app");
        assert_eq!(store.url("sys/init"), "http://127.0.0.1:8200/v1/sys/init");
    }

    #[test]
    fn classify_known_statuses() {
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, "secret/a", String::new()),
            StoreError::PermissionDenied {
                path: "secret/a".into()
            }
        );
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, "secret/a", String::new()),
            StoreError::Sealed
        );
        assert_eq!(
            classify_status(
                StatusCode::BAD_REQUEST,
                "sys/init",
                "Vault is already initialized".into()
            ),
            StoreError::AlreadyInitialized
        );
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, "x", "boom".into()),
            StoreError::UnexpectedResponse { status: 500, .. }
        ));
    }

    #[test]
    fn only_rejected_keys_are_invalid_shares() {
        assert_eq!(
            classify_unseal(StatusCode::BAD_REQUEST, "Unseal failed, invalid key".into()),
            StoreError::InvalidShare("Unseal failed, invalid key".to_string())
        );
        assert_eq!(
            classify_unseal(StatusCode::BAD_REQUEST, "Vault is not initialized".into()),
            StoreError::UnexpectedResponse {
                status: 400,
                message: "Vault is not initialized".to_string()
            }
        );
        assert_eq!(
            classify_unseal(StatusCode::SERVICE_UNAVAILABLE, String::new()),
            StoreError::Sealed
        );
    }

    #[test]
    fn seal_status_response_mapping() {
        let uninit = SealStatusResponse {
            sealed: true,
            initialized: false,
        };
        assert_eq!(uninit.state(), SealState::Uninitialized);
        let sealed = SealStatusResponse {
            sealed: true,
            initialized: true,
        };
        assert_eq!(sealed.state(), SealState::Sealed);
    }
}
