use thiserror::Error;

use clinicstock_core::{DomainError, ItemId};
use clinicstock_gateway::GatewayError;

/// Failure of one client operation.
///
/// Nothing here is fatal: every variant belongs to a single operation and the
/// local intent that triggered it is left in place for a retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Caught locally; nothing was sent to the backend.
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The authoritative re-read found no such item.
    #[error("item {0} not found")]
    NotFound(ItemId),

    /// An operation needs an item that has not been loaded yet.
    #[error("no item loaded")]
    NotLoaded,
}

impl ClientError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }

    /// Message to show the user; backend messages are passed through.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(DomainError::Validation(msg)) => msg.clone(),
            ClientError::Gateway(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
