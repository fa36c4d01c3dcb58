use crate::bootstrap::BootstrapState;
use crate::gateway::routes;
use crate::platform::Namespace;
use crate::store::{AccessToken, SecretStore};

use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

/// The immutable `{token, namespace}` pair the gateway reads with.
#[derive(Debug, Clone)]
pub struct GatewayCredentials {
    pub token: AccessToken,
    pub namespace: Namespace,
}

/// Shared state for the gateway server. Read-only after construction.
#[derive(Clone)]
pub struct GatewayState {
    pub store: Arc<dyn SecretStore>,
    pub credentials: Arc<GatewayCredentials>,
    pub request_timeout: Duration,
    pub bootstrap_state: BootstrapState,
    pub start_time: std::time::Instant,
    pub version: String,
}

impl GatewayState {
    pub fn new(
        store: Arc<dyn SecretStore>,
        credentials: GatewayCredentials,
        request_timeout: Duration,
        bootstrap_state: BootstrapState,
    ) -> Self {
        Self {
            store,
            credentials: Arc::new(credentials),
            request_timeout,
            bootstrap_state,
            start_time: std::time::Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// The gateway server.
pub struct GatewayServer {
    state: GatewayState,
    addr: SocketAddr,
}

impl GatewayServer {
    pub fn new(state: GatewayState, addr: SocketAddr) -> Self {
        Self { state, addr }
    }

    /// Run the server until shutdown signal is received.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let app = build_router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let local = listener.local_addr()?;
        info!("vaultgate v{} ready and listening on {}", self.state.version, local.port());
        print_startup_banner(&self.state, &local);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Gateway server shut down gracefully");
        Ok(())
    }
}

/// Build the Axum router with all routes.
fn build_router(state: GatewayState) -> Router {
    routes::build_routes(state)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

/// Print startup banner with server info.
fn print_startup_banner(state: &GatewayState, addr: &SocketAddr) {
    info!("-------------------------------------------");
    info!("  vaultgate v{}", state.version);
    info!("  Listening on: http://{}", addr);
    info!("  Store: {}", state.store.name());
    info!("  Namespace: {}", state.credentials.namespace);
    info!("  Bootstrap: {}", state.bootstrap_state);
    info!("  Health: http://{}/api/health", addr);
    info!("-------------------------------------------");
}
