//! # Error Types
//!
//! Parse failures for the canonical value types.

use thiserror::Error;

/// A raw value could not be converted into its canonical domain type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Identifier is not a well-formed UUID.
    #[error("invalid submission id '{0}'")]
    InvalidSubmissionId(String),

    /// User identifiers must be non-empty and free of whitespace.
    #[error("invalid user id '{0}'")]
    InvalidUserId(String),

    /// Not an ISO 3166-1 alpha-2 country code.
    #[error("invalid country code '{0}': expected two ASCII letters")]
    InvalidCountry(String),

    /// Unknown enum variant.
    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}

impl ParseError {
    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        ParseError::UnknownVariant {
            kind,
            value: value.to_string(),
        }
    }
}

/// Errors returned by an [`IdentityResolver`](crate::IdentityResolver).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// No credential was presented.
    #[error("missing credential")]
    MissingCredential,

    /// The credential does not resolve to any user.
    #[error("unknown or invalid credential")]
    InvalidCredential,

    /// The credential resolved to a deactivated account.
    #[error("user {0} is inactive")]
    Inactive(String),

    /// The identity provider could not be reached.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Stable, client-visible error kinds.
///
/// Every rejection carries one of these next to a human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    AlreadyFinalized,
    ValidationError,
    ConflictError,
    DeliveryFailure,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyFinalized => "already_finalized",
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::ConflictError => "conflict_error",
            ErrorKind::DeliveryFailure => "delivery_failure",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
