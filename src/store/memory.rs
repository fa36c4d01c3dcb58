//! In-process secret store.
//!
//! Mirrors the seal/unseal and access rules of the HTTP store closely enough
//! to drive the bootstrap controller and gateway without a real server.
//! Every operation is counted, and the store can be switched into an
//! unreachable mode or given an artificial read latency.

use super::{
    validate_share_config, AccessToken, Result, RootCredential, SealState, SecretRecord,
    SecretStore, StoreError, UnsealKey,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use subtle::ConstantTimeEq;

#[derive(Default)]
struct Inner {
    root_token: Option<String>,
    unseal_key: Option<String>,
    sealed: bool,
    records: HashMap<String, SecretRecord>,
}

#[derive(Default)]
struct Counters {
    is_initialized: AtomicUsize,
    initialize: AtomicUsize,
    unseal: AtomicUsize,
    seal_status: AtomicUsize,
    write: AtomicUsize,
    read: AtomicUsize,
}

/// Snapshot of how many times each operation was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallCounts {
    pub is_initialized: usize,
    pub initialize: usize,
    pub unseal: usize,
    pub seal_status: usize,
    pub write: usize,
    pub read: usize,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
    counters: Counters,
    unavailable: AtomicBool,
    read_delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    /// A brand-new, uninitialized store.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            counters: Counters::default(),
            unavailable: AtomicBool::new(false),
            read_delay: Mutex::new(None),
        }
    }

    /// A store initialized by some earlier run, using the given credentials.
    pub fn preinitialized(root_token: &str, unseal_key: &str, sealed: bool) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock();
            inner.root_token = Some(root_token.to_string());
            inner.unseal_key = Some(unseal_key.to_string());
            inner.sealed = sealed;
        }
        store
    }

    /// Place a record directly, bypassing authentication.
    pub fn seed(&self, path: &str, record: SecretRecord) {
        self.inner.lock().records.insert(normalize(path), record);
    }

    /// Look at a record directly, bypassing authentication.
    pub fn peek(&self, path: &str) -> Option<SecretRecord> {
        self.inner.lock().records.get(&normalize(path)).cloned()
    }

    pub fn seal(&self) {
        self.inner.lock().sealed = true;
    }

    /// Make every subsequent call fail with a transport error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }

    /// Delay each `read` by the given duration.
    pub fn set_read_delay(&self, delay: Option<Duration>) {
        *self.read_delay.lock() = delay;
    }

    pub fn calls(&self) -> CallCounts {
        let c = &self.counters;
        CallCounts {
            is_initialized: c.is_initialized.load(Ordering::Acquire),
            initialize: c.initialize.load(Ordering::Acquire),
            unseal: c.unseal.load(Ordering::Acquire),
            seal_status: c.seal_status.load(Ordering::Acquire),
            write: c.write.load(Ordering::Acquire),
            read: c.read.load(Ordering::Acquire),
        }
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(StoreError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn safe_equal(a: &str, b: &str) -> bool {
    a.len() == b.len() && bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

impl Inner {
    fn state(&self) -> SealState {
        match (&self.root_token, self.sealed) {
            (None, _) => SealState::Uninitialized,
            (Some(_), true) => SealState::Sealed,
            (Some(_), false) => SealState::Unsealed,
        }
    }

    /// Gate data access on seal state and token.
    fn authorize(&self, token: &AccessToken, path: &str) -> Result<()> {
        match self.state() {
            SealState::Uninitialized | SealState::Sealed => return Err(StoreError::Sealed),
            SealState::Unsealed => {}
        }
        let authorized = self
            .root_token
            .as_deref()
            .is_some_and(|root| safe_equal(root, token.expose()));
        if !authorized {
            return Err(StoreError::PermissionDenied {
                path: path.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn is_initialized(&self) -> Result<bool> {
        self.counters.is_initialized.fetch_add(1, Ordering::AcqRel);
        self.check_reachable()?;
        Ok(self.inner.lock().root_token.is_some())
    }

    async fn initialize(&self, share_count: u8, threshold: u8) -> Result<RootCredential> {
        self.counters.initialize.fetch_add(1, Ordering::AcqRel);
        self.check_reachable()?;
        validate_share_config(share_count, threshold)?;

        let mut inner = self.inner.lock();
        if inner.root_token.is_some() {
            return Err(StoreError::AlreadyInitialized);
        }

        let mut key_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key_bytes);
        let key = hex::encode(key_bytes);
        let token = format!("hvs.{}", uuid::Uuid::new_v4().simple());

        inner.root_token = Some(token.clone());
        inner.unseal_key = Some(key.clone());
        inner.sealed = true;

        // Single-key scheme: every share is the same key.
        Ok(RootCredential {
            root_token: AccessToken::new(token),
            key_shares: vec![UnsealKey::new(key); share_count as usize],
        })
    }

    async fn unseal(&self, share: &UnsealKey) -> Result<SealState> {
        self.counters.unseal.fetch_add(1, Ordering::AcqRel);
        self.check_reachable()?;

        let mut inner = self.inner.lock();
        match inner.state() {
            SealState::Uninitialized => Err(StoreError::InvalidArgument(
                "store is not initialized".to_string(),
            )),
            SealState::Unsealed => Ok(SealState::Unsealed),
            SealState::Sealed => {
                let matches = inner
                    .unseal_key
                    .as_deref()
                    .is_some_and(|key| safe_equal(key, share.expose()));
                if !matches {
                    return Err(StoreError::InvalidShare(
                        "key share does not match".to_string(),
                    ));
                }
                inner.sealed = false;
                Ok(SealState::Unsealed)
            }
        }
    }

    async fn seal_status(&self) -> Result<SealState> {
        self.counters.seal_status.fetch_add(1, Ordering::AcqRel);
        self.check_reachable()?;
        Ok(self.inner.lock().state())
    }

    async fn write(&self, token: &AccessToken, path: &str, record: &SecretRecord) -> Result<()> {
        self.counters.write.fetch_add(1, Ordering::AcqRel);
        self.check_reachable()?;

        let mut inner = self.inner.lock();
        inner.authorize(token, path)?;
        inner.records.insert(normalize(path), record.clone());
        Ok(())
    }

    async fn read(&self, token: &AccessToken, path: &str) -> Result<SecretRecord> {
        self.counters.read.fetch_add(1, Ordering::AcqRel);
        self.check_reachable()?;

        let delay = *self.read_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let inner = self.inner.lock();
        inner.authorize(token, path)?;
        inner
            .records
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_string(),
            })
    }

    fn name(&self) -> &str {
        "memory"
    }
}
