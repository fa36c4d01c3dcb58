use super::defaults::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// Store Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    #[serde(default = "default_store_addr")]
    pub address: String,
    /// Empty means a token must be obtained through initialization.
    #[serde(default)]
    pub token: String,
    /// Operator-supplied key share, used only by the reseed policy.
    #[serde(default)]
    pub unseal_key: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_store_addr() -> String {
    DEFAULT_STORE_ADDR.to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            address: default_store_addr(),
            token: String::new(),
            unseal_key: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

// ============================================================================
// Gateway Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_port() -> u16 {
    DEFAULT_GATEWAY_PORT
}

fn default_bind() -> String {
    DEFAULT_BIND_HOST.to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

// ============================================================================
// Bootstrap Configuration
// ============================================================================

/// What the bootstrap does when the store was initialized by someone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExistingStorePolicy {
    /// Assume prior state is valid; stop without writing.
    #[default]
    Skip,
    /// Re-run the unseal/seed steps with operator-supplied credentials.
    Reseed,
}

impl std::str::FromStr for ExistingStorePolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "reseed" => Ok(Self::Reseed),
            other => Err(format!("invalid existing-store policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapConfig {
    #[serde(default)]
    pub existing_store: ExistingStorePolicy,
    #[serde(default = "default_seed_message")]
    pub seed_message: String,
}

fn default_seed_message() -> String {
    DEFAULT_SEED_MESSAGE.to_string()
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            existing_store: ExistingStorePolicy::default(),
            seed_message: default_seed_message(),
        }
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("invalid log format: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Log root tokens and key shares unredacted. Development only.
    #[serde(default)]
    pub log_secrets: bool,
}

/// Parse the usual truthy spellings.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
