use crate::dsl::DslError;
use crate::storage::StorageError;

/// Issuer errors.
#[derive(thiserror::Error, Debug)]
pub enum IssuerError {
    #[error(transparent)]
    Dsl(#[from] DslError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type IssuerResult<T> = std::result::Result<T, IssuerError>;
