//! Realtime error types.

use shared_types::{ConnectionId, ErrorKind, IdentityError};
use thiserror::Error;

/// Errors from registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The credential did not resolve to an active principal.
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] IdentityError),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::Unauthorized(_) => ErrorKind::Unauthorized,
        }
    }
}

/// A frame could not be handed to a connection. Logged and counted only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryFailure {
    #[error("outbound queue full for connection {0}")]
    QueueFull(ConnectionId),

    #[error("connection {0} is closing")]
    Closed(ConnectionId),

    #[error("connection {0} is not registered")]
    Unknown(ConnectionId),
}

impl DeliveryFailure {
    pub fn connection_id(&self) -> ConnectionId {
        match self {
            DeliveryFailure::QueueFull(id)
            | DeliveryFailure::Closed(id)
            | DeliveryFailure::Unknown(id) => *id,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::DeliveryFailure
    }
}
