use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Per-request failure of a gateway handler.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Field '{field}' not present in secret at '{path}'")]
    MissingField { field: String, path: String },
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Store(err) => match err {
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
                StoreError::Sealed => StatusCode::SERVICE_UNAVAILABLE,
                StoreError::Transport(_) => StatusCode::BAD_GATEWAY,
                StoreError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            GatewayError::MissingField { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Store(err) => err.kind(),
            GatewayError::MissingField { .. } => "missing_field",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
