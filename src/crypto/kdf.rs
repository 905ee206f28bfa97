use crate::crypto::errors::{CryptoResult, Error};
use crate::crypto::keys::SecureBytes;
use ring::hkdf;

/// Parameters for HKDF-SHA256 key derivation (RFC 5869)
#[derive(Debug, Clone)]
pub struct KdfParams {
    /// Extraction salt
    pub salt: Vec<u8>,
    /// Context and application specific info
    pub info: Vec<u8>,
    /// Output key length in bytes
    pub output_length: usize,
}

impl KdfParams {
    /// Create new KDF parameters with an empty salt and info
    pub fn new(output_length: usize) -> Self {
        Self {
            salt: Vec::new(),
            info: Vec::new(),
            output_length,
        }
    }

    /// Set the salt used in the extract step
    pub fn with_salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.salt = salt.into();
        self
    }

    /// Set the info bound into the expand step
    pub fn with_info(mut self, info: impl Into<Vec<u8>>) -> Self {
        self.info = info.into();
        self
    }
}

struct OutputLen(usize);

impl hkdf::KeyType for OutputLen {
    fn len(&self) -> usize {
        self.0
    }
}

/// Derive a key from input keying material with HKDF-SHA256
pub fn derive_key(ikm: impl AsRef<[u8]>, params: &KdfParams) -> CryptoResult<SecureBytes> {
    let salt = hkdf::Salt::new(hkdf::HKDF_SHA256, &params.salt);
    let prk = salt.extract(ikm.as_ref());
    let info = [params.info.as_slice()];
    let okm = prk
        .expand(&info, OutputLen(params.output_length))
        .map_err(|_| Error::Kdf)?;

    let mut out = vec![0u8; params.output_length];
    okm.fill(&mut out).map_err(|_| Error::Kdf)?;
    Ok(SecureBytes::new(out))
}
