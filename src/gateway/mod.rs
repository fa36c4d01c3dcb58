//! Read-through HTTP gateway for the bootstrapped secret.
//!
//! Every request re-reads from the store; there is no cache.

mod error;
pub mod routes;
mod server;

pub use error::GatewayError;
pub use server::*;
