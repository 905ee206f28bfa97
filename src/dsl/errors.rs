use thiserror::Error;

use super::types::CredentialId;

/// Errors raised by the status list protocol
#[derive(Error, Debug)]
pub enum DslError {
    /// Malformed input: bad hex/base64, missing claim, unparsable token
    #[error("Invalid input: {0}")]
    Input(String),

    /// The credential is not tracked by the registry
    #[error("Credential not found: {0}. Create a new entry first")]
    NotFound(CredentialId),

    /// Neither candidate identifier is in the publication
    #[error("Status list identifier not found (stale publication or wrong epoch)")]
    IdentifierNotFound,

    /// Both candidate identifiers are in the publication
    #[error("Both the valid and the revoked identifier are published")]
    AmbiguousResult,

    /// A credential bundle carries no private status metadata
    #[error("Private status metadata missing")]
    MissingMetadata,

    /// A publication failed signature or header checks
    #[error("Publication rejected: {0}")]
    InvalidPublication(String),

    /// Signing, HMAC or key handling failed
    #[error("Cryptographic failure: {0}")]
    Crypto(#[from] crate::crypto::Error),
}

impl DslError {
    /// Errors that indicate a bug or a broken primitive rather than bad input
    pub fn is_fatal(&self) -> bool {
        matches!(self, DslError::AmbiguousResult | DslError::Crypto(_))
    }
}

/// Convenient Result type alias
pub type DslResult<T> = Result<T, DslError>;
