use super::{Config, ExistingStorePolicy};
use anyhow::Result;
use tracing::warn;

/// Validation errors for configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate a configuration object.
pub fn validate_config(config: &Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.store.address) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ConfigValidationError {
            path: "store.address".to_string(),
            message: format!("Unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ConfigValidationError {
            path: "store.address".to_string(),
            message: format!("Invalid URL: {e}"),
        }),
    }

    if config.store.request_timeout_ms == 0 {
        errors.push(ConfigValidationError {
            path: "store.requestTimeoutMs".to_string(),
            message: "Timeout must be greater than 0".to_string(),
        });
    }

    if let Some(ns) = &config.namespace {
        if ns.trim().trim_matches('/').is_empty() {
            errors.push(ConfigValidationError {
                path: "namespace".to_string(),
                message: "Namespace override must not be empty".to_string(),
            });
        }
    }

    if config.bind_host().parse::<std::net::IpAddr>().is_err() {
        errors.push(ConfigValidationError {
            path: "gateway.bind".to_string(),
            message: format!("Invalid bind address '{}'", config.gateway.bind),
        });
    }

    if config.bootstrap.existing_store == ExistingStorePolicy::Reseed
        && config.store.token.is_empty()
    {
        warn!("Existing-store policy is 'reseed' but no store token is configured");
    }

    errors
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &Config) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&Config::default()).is_empty());
    }

    #[test]
    fn rejects_bad_address_and_timeout() {
        let mut config = Config::default();
        config.store.address = "ftp://vault".to_string();
        config.store.request_timeout_ms = 0;
        let errors = validate_config(&config);
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["store.address", "store.requestTimeoutMs"]);
        assert!(validate_config_object(&config).is_err());
    }

    #[test]
    fn rejects_empty_namespace_and_bad_bind() {
        let mut config = Config::default();
        config.namespace = Some("//".to_string());
        config.gateway.bind = "not-an-ip".to_string();
        assert_eq!(validate_config(&config).len(), 2);
    }
}
