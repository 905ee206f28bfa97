mod curves;
pub mod ecdsa;
mod errors;
pub mod jws;
pub mod kdf;
mod keys;
pub mod mac;
mod utils;

pub use curves::Curve;
pub use errors::Error;
pub use keys::{PrivateKey, PublicKey, SecureBytes};
pub use utils::*;

pub(crate) use errors::CryptoResult;
use openssl::hash::MessageDigest as Digest;

/// Hash algorithms supported for signing operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlg {
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
}

impl From<&HashAlg> for Digest {
    fn from(hash_alg: &HashAlg) -> Self {
        match hash_alg {
            HashAlg::Sha256 => Digest::sha256(),
            HashAlg::Sha384 => Digest::sha384(),
        }
    }
}

impl From<HashAlg> for Digest {
    fn from(hash_alg: HashAlg) -> Self {
        (&hash_alg).into()
    }
}

/// SHA-256 over the concatenation of `parts`. Infallible, so the status
/// list derivations carry no error plumbing.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = openssl::sha::Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finish()
}
