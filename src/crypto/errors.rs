use openssl::error::ErrorStack;
use thiserror::Error;

pub(crate) type CryptoResult<T> = Result<T, Error>;

/// Error type for cryptographic operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid data format or corrupted data
    #[error("Invalid data: {0}")]
    Invalid(String),

    /// Unsupported curve or algorithm
    #[error("Unsupported curve: {0}")]
    UnsupportedCurve(String),

    /// Internal OpenSSL error
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] ErrorStack),

    /// Key derivation failed inside ring
    #[error("Key derivation failed")]
    Kdf,

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Base64 decoding error
    #[error("Encoding error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// JSON inside a token could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A compact JWS could not be parsed
    #[error("Malformed JWS: {0}")]
    MalformedJws(String),

    /// A JWS signature did not verify
    #[error("JWS signature verification failed")]
    BadSignature,
}
