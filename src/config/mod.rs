mod defaults;
mod types;
mod validation;

pub use defaults::*;
pub use types::*;
pub use validation::*;

use crate::platform::{AppIdentity, Namespace};
use crate::store::redact_secret;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level vaultgate configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Explicit namespace; wins over the platform identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Config {
    /// The config file to read: the explicit path, else the first standard
    /// location that exists.
    pub fn locate(path: Option<&str>) -> Option<PathBuf> {
        path.map(PathBuf::from).or_else(find_config_file)
    }

    /// Load configuration from file, environment, and defaults.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(config_path) if config_path.exists() => load_config_file(config_path)?,
            Some(config_path) => {
                anyhow::bail!("Config file '{}' does not exist", config_path.display())
            }
            None => Config::default(),
        };

        // Apply environment variable overrides
        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("VAULT_ADDR").filter(|v| !v.is_empty()) {
            self.store.address = addr;
        }

        if let Some(token) = lookup("VAULT_TOKEN") {
            self.store.token = token;
        }

        if let Some(key) = lookup("VAULT_UNSEAL_KEY").filter(|v| !v.is_empty()) {
            self.store.unseal_key = Some(key);
        }

        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.gateway.port = port;
        }

        if let Some(bind) = lookup("VAULTGATE_BIND").filter(|v| !v.is_empty()) {
            self.gateway.bind = bind;
        }

        if let Some(ns) = lookup("VAULTGATE_NAMESPACE") {
            self.namespace = Some(ns);
        }

        if let Some(policy) = lookup("VAULTGATE_EXISTING_STORE").and_then(|p| p.parse().ok()) {
            self.bootstrap.existing_store = policy;
        }

        if let Some(message) = lookup("VAULTGATE_SEED_MESSAGE") {
            self.bootstrap.seed_message = message;
        }

        if let Some(ms) = lookup("VAULTGATE_REQUEST_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.store.request_timeout_ms = ms;
        }

        if let Some(flag) = lookup("VAULTGATE_LOG_SECRETS").and_then(|v| parse_flag(&v)) {
            self.logging.log_secrets = flag;
        }

        if let Some(format) = lookup("VAULTGATE_LOG_FORMAT").and_then(|v| v.parse().ok()) {
            self.logging.format = format;
        }
    }

    /// Namespace for this process: override, platform identity, fallback.
    pub fn resolve_namespace(&self) -> Namespace {
        let identity = AppIdentity::from_env();
        Namespace::resolve(self.namespace.as_deref(), identity.as_ref())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.store.request_timeout_ms)
    }

    pub fn bind_host(&self) -> &str {
        self.gateway.bind.trim()
    }

    /// Socket address for the gateway listener.
    pub fn socket_addr(&self, port_override: Option<u16>, bind_override: Option<&str>) -> Result<SocketAddr> {
        let host = bind_override.unwrap_or_else(|| self.bind_host());
        let port = port_override.unwrap_or(self.gateway.port);
        let ip: std::net::IpAddr = host
            .parse()
            .with_context(|| format!("Invalid bind address '{host}'"))?;
        Ok(SocketAddr::new(ip, port))
    }

    /// Copy with credentials redacted, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.store.token.is_empty() {
            copy.store.token = redact_secret(&copy.store.token);
        }
        copy.store.unseal_key = copy.store.unseal_key.as_deref().map(redact_secret);
        copy
    }
}

/// Find the configuration file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let candidates = ["json", "yaml", "yml", "toml"]
        .iter()
        .map(|ext| PathBuf::from(format!("{CONFIG_FILE_STEM}.{ext}")));

    for path in candidates {
        if path.exists() {
            return Some(path);
        }
    }

    // Check home directory
    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".vaultgate").join("config.json");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}

/// Load configuration from a file path.
fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config(&content, path.extension().and_then(|e| e.to_str()))
}

/// Parse configuration text; the extension selects the format.
pub fn parse_config(content: &str, extension: Option<&str>) -> Result<Config> {
    let config = match extension {
        Some("yaml") | Some("yml") => serde_yaml::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        _ => {
            // Try JSON5 first, then regular JSON
            json5::from_str(content).or_else(|_| {
                serde_json::from_str(content).map_err(|e| json5::Error::Message {
                    msg: e.to_string(),
                    location: None,
                })
            })?
        }
    };

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_reference_behavior() {
        let config = Config::default();
        assert_eq!(config.store.address, "http://127.0.0.1:8200");
        assert_eq!(config.store.token, "");
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.bootstrap.seed_message, "Hello World");
        assert_eq!(config.bootstrap.existing_store, ExistingStorePolicy::Skip);
        assert!(!config.logging.log_secrets);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config.apply_overrides(lookup_from(&[
            ("VAULT_ADDR", "https://vault.internal:8200"),
            ("VAULT_TOKEN", "s.abcdef123456"),
            ("PORT", "8080"),
            ("VAULTGATE_EXISTING_STORE", "Reseed"),
            ("VAULTGATE_LOG_SECRETS", "yes"),
            ("VAULTGATE_LOG_FORMAT", "json"),
            ("VAULTGATE_REQUEST_TIMEOUT_MS", "2500"),
        ]));
        assert_eq!(config.store.address, "https://vault.internal:8200");
        assert_eq!(config.store.token, "s.abcdef123456");
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.bootstrap.existing_store, ExistingStorePolicy::Reseed);
        assert!(config.logging.log_secrets);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.request_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn unparseable_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(lookup_from(&[
            ("PORT", "not-a-port"),
            ("VAULTGATE_EXISTING_STORE", "sometimes"),
            ("VAULT_ADDR", ""),
        ]));
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.bootstrap.existing_store, ExistingStorePolicy::Skip);
        assert_eq!(config.store.address, DEFAULT_STORE_ADDR);
    }

    #[test]
    fn parses_each_file_format() {
        let json = parse_config(r#"{ store: { address: "http://v:1" }, gateway: { port: 9 } }"#, Some("json")).unwrap();
        assert_eq!(json.store.address, "http://v:1");
        assert_eq!(json.gateway.port, 9);

        let yaml = parse_config("bootstrap:\n  existingStore: reseed\n", Some("yaml")).unwrap();
        assert_eq!(yaml.bootstrap.existing_store, ExistingStorePolicy::Reseed);

        let toml = parse_config("namespace = \"secret/x\"\n[logging]\nlogSecrets = true\n", Some("toml")).unwrap();
        assert_eq!(toml.namespace.as_deref(), Some("secret/x"));
        assert!(toml.logging.log_secrets);
    }

    #[test]
    fn redacted_hides_credentials() {
        let mut config = Config::default();
        config.store.token = "hvs.supersecretvalue".to_string();
        config.store.unseal_key = Some("0123456789abcdef".to_string());
        let shown = serde_json::to_string(&config.redacted()).unwrap();
        assert!(!shown.contains("supersecret"));
        assert!(!shown.contains("456789abc"));
    }

    #[test]
    fn socket_addr_uses_overrides() {
        let config = Config::default();
        let addr = config.socket_addr(Some(4000), Some("127.0.0.1")).unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:4000");
        assert!(config.socket_addr(None, Some("nope")).is_err());
    }

    #[test]
    fn explicit_config_path_is_located_and_must_exist() {
        let located = Config::locate(Some("conf/vaultgate.yaml"));
        assert_eq!(located, Some(PathBuf::from("conf/vaultgate.yaml")));

        let err = Config::load_from(located.as_deref()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
