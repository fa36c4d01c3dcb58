//! vaultgate: bootstraps a Vault-style secret store and serves one secret.
//!
//! At startup the [`bootstrap`] controller brings an uninitialized store to
//! an unsealed, seeded state exactly once. The [`gateway`] then serves the
//! seeded record read-through over HTTP, using the immutable credentials the
//! bootstrap produced.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod platform;
pub mod store;
