use thiserror::Error;

/// Gateway operation error.
///
/// These are transport and backend failures. Local validation happens before
/// anything reaches the gateway, so none of these mean "bad user input" except
/// where the backend itself rejected the request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No valid session; the caller should send the user to sign in.
    #[error("not signed in")]
    Unauthorized,

    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with an error, e.g. a procedure raised.
    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    /// Message suitable for showing to the user as-is.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Backend { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
