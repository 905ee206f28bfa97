use crate::crypto::HashAlg;
use crate::crypto::errors::{CryptoResult, Error};
use openssl::pkey::PKey;
use openssl::sign::Signer;

/// Compute an HMAC over `data` keyed with `key`
pub fn hmac(hash_alg: HashAlg, key: impl AsRef<[u8]>, data: impl AsRef<[u8]>) -> CryptoResult<Vec<u8>> {
    let pkey = PKey::hmac(key.as_ref())?;
    let mut signer = Signer::new(hash_alg.into(), &pkey)?;
    signer.update(data.as_ref())?;
    Ok(signer.sign_to_vec()?)
}

/// HMAC-SHA256 returning a fixed-size tag
pub fn hmac_sha256(key: impl AsRef<[u8]>, data: impl AsRef<[u8]>) -> CryptoResult<[u8; 32]> {
    let tag = hmac(HashAlg::Sha256, key, data)?;
    tag.try_into()
        .map_err(|tag: Vec<u8>| Error::Invalid(format!("HMAC tag has {} bytes", tag.len())))
}
