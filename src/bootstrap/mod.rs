//! First-run bootstrap of the secret store.
//!
//! An explicit state machine:
//!
//! ```text
//! Start -> CheckedInit -> Initialized -> Unsealed -> Seeded
//!    \________\_______________\____________\________-> Failed
//! ```
//!
//! Each step makes one store call. Any error is matched on its kind, logged,
//! and ends the run in `Failed`; nothing is retried and nothing propagates to
//! the host process.
//!
//! Against a store that is already initialized, `initialize` is never called
//! again. The [`ExistingStorePolicy`] decides what happens instead:
//!
//! - `Skip`: stop at `Initialized` and assume the prior run left the store
//!   unsealed and seeded.
//! - `Reseed`: continue to unseal/seed with the operator-supplied token and
//!   optional unseal key from configuration. Without a token the run fails
//!   with `MissingCredential`.

use crate::config::{Config, ExistingStorePolicy, INIT_SHARE_COUNT, INIT_THRESHOLD};
use crate::gateway::GatewayCredentials;
use crate::platform::Namespace;
use crate::store::{AccessToken, SealState, SecretRecord, SecretStore, StoreError, UnsealKey};
use serde::{Serialize, Serializer};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapState {
    Start,
    CheckedInit,
    Initialized,
    Unsealed,
    Seeded,
    Failed,
}

impl BootstrapState {
    pub fn is_failed(self) -> bool {
        matches!(self, BootstrapState::Failed)
    }
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BootstrapState::Start => "start",
            BootstrapState::CheckedInit => "checked_init",
            BootstrapState::Initialized => "initialized",
            BootstrapState::Unsealed => "unsealed",
            BootstrapState::Seeded => "seeded",
            BootstrapState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Inputs that shape a bootstrap run.
#[derive(Debug, Clone)]
pub struct BootstrapSettings {
    pub existing_store: ExistingStorePolicy,
    pub seed_message: String,
    /// Token from configuration; used for the reseed path and handed to the
    /// gateway when initialization does not produce one.
    pub configured_token: AccessToken,
    pub configured_unseal_key: Option<UnsealKey>,
    pub step_timeout: Duration,
    pub log_secrets: bool,
}

impl BootstrapSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            existing_store: config.bootstrap.existing_store,
            seed_message: config.bootstrap.seed_message.clone(),
            configured_token: AccessToken::new(config.store.token.clone()),
            configured_unseal_key: config.store.unseal_key.clone().map(UnsealKey::new),
            step_timeout: config.request_timeout(),
            log_secrets: config.logging.log_secrets,
        }
    }
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Why a run ended in `Failed`.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapFailure {
    /// State the controller was in when the failing step started.
    pub during: BootstrapState,
    pub kind: &'static str,
    pub message: String,
    #[serde(skip)]
    pub error: StoreError,
}

/// Outcome of one bootstrap run. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapReport {
    pub state: BootstrapState,
    pub visited: Vec<BootstrapState>,
    pub namespace: Namespace,
    /// Whether this run created the root credential.
    pub freshly_initialized: bool,
    #[serde(serialize_with = "serialize_redacted")]
    pub token: AccessToken,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<BootstrapFailure>,
}

fn serialize_redacted<S: Serializer>(token: &AccessToken, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&token.redacted())
}

impl BootstrapReport {
    pub fn is_failed(&self) -> bool {
        self.state.is_failed()
    }

    pub fn error(&self) -> Option<&StoreError> {
        self.failure.as_ref().map(|f| &f.error)
    }

    /// The `{token, namespace}` pair the gateway is built from.
    pub fn credentials(&self) -> GatewayCredentials {
        GatewayCredentials {
            token: self.token.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Tracks progress through the state machine during one run.
struct Run {
    state: BootstrapState,
    visited: Vec<BootstrapState>,
    namespace: Namespace,
    token: Option<AccessToken>,
    freshly_initialized: bool,
}

impl Run {
    fn new(namespace: Namespace) -> Self {
        Self {
            state: BootstrapState::Start,
            visited: vec![BootstrapState::Start],
            namespace,
            token: None,
            freshly_initialized: false,
        }
    }

    fn advance(&mut self, next: BootstrapState) {
        info!(from = %self.state, to = %next, "Bootstrap transition");
        self.state = next;
        self.visited.push(next);
    }

    fn finish(self, fallback_token: &AccessToken) -> BootstrapReport {
        BootstrapReport {
            state: self.state,
            visited: self.visited,
            namespace: self.namespace,
            freshly_initialized: self.freshly_initialized,
            token: self.token.unwrap_or_else(|| fallback_token.clone()),
            failure: None,
        }
    }

    fn fail(mut self, err: StoreError, fallback_token: &AccessToken) -> BootstrapReport {
        let during = self.state;
        error!(
            during = %during,
            kind = err.kind(),
            transient = err.is_transient(),
            "Bootstrap failed: {}",
            err
        );
        self.state = BootstrapState::Failed;
        self.visited.push(BootstrapState::Failed);

        let mut report = self.finish(fallback_token);
        report.failure = Some(BootstrapFailure {
            during,
            kind: err.kind(),
            message: err.to_string(),
            error: err,
        });
        report
    }
}

pub struct BootstrapController<'a> {
    store: &'a dyn SecretStore,
    namespace: Namespace,
    settings: BootstrapSettings,
}

impl<'a> BootstrapController<'a> {
    pub fn new(store: &'a dyn SecretStore, namespace: Namespace, settings: BootstrapSettings) -> Self {
        Self {
            store,
            namespace,
            settings,
        }
    }

    /// Drive the store from `Start` to a terminal state. Never panics and
    /// never returns an error; failures are captured in the report.
    pub async fn run(&self) -> BootstrapReport {
        let fallback = &self.settings.configured_token;
        let mut run = Run::new(self.namespace.clone());
        info!(store = self.store.name(), namespace = %self.namespace, "Starting bootstrap");

        // Start -> CheckedInit
        let initialized = match self.call(self.store.is_initialized()).await {
            Ok(initialized) => initialized,
            Err(e) => return run.fail(e, fallback),
        };
        run.advance(BootstrapState::CheckedInit);

        // CheckedInit -> Initialized
        let share = if initialized {
            match self.settings.existing_store {
                ExistingStorePolicy::Skip => {
                    info!("Store already initialized; skipping setup and assuming prior state is valid");
                    run.advance(BootstrapState::Initialized);
                    return run.finish(fallback);
                }
                ExistingStorePolicy::Reseed => {
                    if fallback.is_empty() {
                        return run.fail(
                            StoreError::MissingCredential(
                                "reseeding an initialized store requires a configured token"
                                    .to_string(),
                            ),
                            fallback,
                        );
                    }
                    info!("Store already initialized; reseeding with configured credentials");
                    run.token = Some(fallback.clone());
                    self.settings.configured_unseal_key.clone()
                }
            }
        } else {
            match self
                .call(self.store.initialize(INIT_SHARE_COUNT, INIT_THRESHOLD))
                .await
            {
                Ok(credential) => {
                    self.log_credential(&credential.root_token, credential.first_share());
                    run.freshly_initialized = true;
                    run.token = Some(credential.root_token.clone());
                    match credential.first_share() {
                        Some(share) => Some(share.clone()),
                        None => {
                            return run.fail(
                                StoreError::MissingCredential(
                                    "initialize returned no key shares".to_string(),
                                ),
                                fallback,
                            )
                        }
                    }
                }
                Err(e) => return run.fail(e, fallback),
            }
        };
        run.advance(BootstrapState::Initialized);

        // Initialized -> Unsealed
        let seal_state = match &share {
            Some(share) => self.call(self.store.unseal(share)).await,
            None => self.call(self.store.seal_status()).await,
        };
        match seal_state {
            Ok(SealState::Unsealed) => run.advance(BootstrapState::Unsealed),
            Ok(other) => {
                warn!(state = %other, "Store did not report unsealed");
                return run.fail(StoreError::Sealed, fallback);
            }
            Err(e) => return run.fail(e, fallback),
        }

        // Unsealed -> Seeded
        let token = run.token.clone().unwrap_or_else(|| fallback.clone());
        let record = SecretRecord::with_message(self.settings.seed_message.clone());
        if let Err(e) = self
            .call(self.store.write(&token, self.namespace.as_str(), &record))
            .await
        {
            return run.fail(e, fallback);
        }
        run.advance(BootstrapState::Seeded);

        info!(namespace = %self.namespace, "Bootstrap complete");
        run.finish(fallback)
    }

    /// Bound a store call by the step timeout.
    async fn call<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.settings.step_timeout, fut)
            .await
            .unwrap_or(Err(StoreError::Timeout))
    }

    fn log_credential(&self, token: &AccessToken, share: Option<&UnsealKey>) {
        if self.settings.log_secrets {
            warn!(
                root_token = token.expose(),
                unseal_key = share.map(|s| s.expose()).unwrap_or(""),
                "Store initialized (secret logging enabled)"
            );
        } else {
            info!(root_token = %token, "Store initialized");
        }
    }
}

/// Run the controller with settings taken from configuration.
pub async fn run_bootstrap(store: &dyn SecretStore, namespace: Namespace, config: &Config) -> BootstrapReport {
    BootstrapController::new(store, namespace, BootstrapSettings::from_config(config))
        .run()
        .await
}

// ============================================================================
// Tests
// ============================================================================
