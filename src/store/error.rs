/// Errors returned by secret store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Store unreachable or the connection failed mid-request.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The call did not complete within the request timeout.
    #[error("Request timeout")]
    Timeout,

    #[error("Secret store is already initialized")]
    AlreadyInitialized,

    #[error("Invalid unseal key share: {0}")]
    InvalidShare(String),

    #[error("Permission denied for path '{path}'")]
    PermissionDenied { path: String },

    #[error("No secret found at path '{path}'")]
    NotFound { path: String },

    #[error("Secret store is sealed")]
    Sealed,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A step needed a credential that neither initialization nor
    /// configuration provided.
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Unexpected response ({status}): {message}")]
    UnexpectedResponse { status: u16, message: String },
}

impl StoreError {
    /// Stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Transport(_) => "transport",
            StoreError::Timeout => "timeout",
            StoreError::AlreadyInitialized => "already_initialized",
            StoreError::InvalidShare(_) => "invalid_share",
            StoreError::PermissionDenied { .. } => "permission_denied",
            StoreError::NotFound { .. } => "not_found",
            StoreError::Sealed => "sealed",
            StoreError::InvalidArgument(_) => "invalid_argument",
            StoreError::MissingCredential(_) => "missing_credential",
            StoreError::UnexpectedResponse { .. } => "unexpected_response",
        }
    }

    /// Whether a later attempt could succeed without operator action.
    ///
    /// Nothing retries today; this marks where backoff would hook in.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Transport(_) | StoreError::Timeout | StoreError::Sealed
        )
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StoreError::Timeout
        } else {
            StoreError::Transport(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
