use crate::gateway::error::GatewayError;
use crate::gateway::server::GatewayState;
use crate::store::{SealState, SecretRecord, StoreError};

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Field served by `GET /`.
pub const MESSAGE_FIELD: &str = "message";

/// Build all routes for the gateway.
pub fn build_routes(state: GatewayState) -> Router {
    Router::new()
        // Secret
        .route("/", get(message_handler))
        .route("/record", get(record_handler))
        // Health
        .route("/api/health", get(health_handler))
        // Read failures are logged once, by `logged`.
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http().on_failure(())))
        .with_state(state)
}

// ============================================================================
// Secret
// ============================================================================

/// One read-through fetch, bounded by the request timeout.
async fn read_record(state: &GatewayState) -> Result<SecretRecord, GatewayError> {
    let credentials = &state.credentials;
    let path = credentials.namespace.as_str();

    let record = tokio::time::timeout(
        state.request_timeout,
        state.store.read(&credentials.token, path),
    )
    .await
    .unwrap_or(Err(StoreError::Timeout))?;

    debug!(path, fields = record.len(), "Read secret");
    Ok(record)
}

/// Every failed request is logged here, once.
fn logged<T>(state: &GatewayState, result: Result<T, GatewayError>) -> Result<T, GatewayError> {
    if let Err(e) = &result {
        error!(
            path = state.credentials.namespace.as_str(),
            kind = e.kind(),
            status = e.status().as_u16(),
            "Secret read failed: {}",
            e
        );
    }
    result
}

async fn message_handler(State(state): State<GatewayState>) -> Result<String, GatewayError> {
    let message = read_record(&state).await.and_then(|record| {
        record
            .field_text(MESSAGE_FIELD)
            .ok_or_else(|| GatewayError::MissingField {
                field: MESSAGE_FIELD.to_string(),
                path: state.credentials.namespace.to_string(),
            })
    });
    logged(&state, message)
}

async fn record_handler(
    State(state): State<GatewayState>,
) -> Result<Json<SecretRecord>, GatewayError> {
    logged(&state, read_record(&state).await).map(Json)
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime: u64,
    pub bootstrap_state: String,
    pub namespace: String,
    pub seal_state: Option<SealState>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

async fn health_handler(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let seal_state = tokio::time::timeout(state.request_timeout, state.store.seal_status())
        .await
        .ok()
        .and_then(|r| r.ok());

    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
        uptime: state.start_time.elapsed().as_secs(),
        bootstrap_state: state.bootstrap_state.to_string(),
        namespace: state.credentials.namespace.to_string(),
        seal_state,
        timestamp: chrono::Utc::now(),
    })
}
