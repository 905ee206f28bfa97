use crate::crypto::HashAlg;
use crate::crypto::curves::Curve;
use crate::crypto::errors::{CryptoResult, Error};
use crate::crypto::keys::{PrivateKey, PublicKey};
use openssl::bn::BigNum;
use openssl::ecdsa::EcdsaSig as OpenSslEcdsaSig;
use openssl::sign::{Signer, Verifier};
use std::fmt;

/// ECDSA signature representation
#[derive(Clone, PartialEq, Eq)]
pub struct EcdsaSig {
    // The curve used for this signature
    curve: Curve,
    // DER-encoded signature data
    der_data: Vec<u8>,
}

impl EcdsaSig {
    /// Create signature from DER-encoded signature data
    pub fn from_der(curve: Curve, der_data: impl AsRef<[u8]>) -> CryptoResult<Self> {
        // Parse once to reject garbage early
        OpenSslEcdsaSig::from_der(der_data.as_ref())?;

        Ok(Self {
            curve,
            der_data: der_data.as_ref().to_vec(),
        })
    }

    /// Create signature from the fixed-width `r || s` form used by JWS
    pub fn from_raw(curve: Curve, raw: &[u8]) -> CryptoResult<Self> {
        if raw.len() != curve.signature_size() {
            return Err(Error::Invalid(format!(
                "Raw signature must be {} bytes, got {}",
                curve.signature_size(),
                raw.len()
            )));
        }

        let (r, s) = raw.split_at(curve.key_size());
        let ecdsa_sig =
            OpenSslEcdsaSig::from_private_components(BigNum::from_slice(r)?, BigNum::from_slice(s)?)?;

        Ok(Self {
            curve,
            der_data: ecdsa_sig.to_der()?,
        })
    }

    /// Get the curve used for this signature
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// Get DER-encoded signature data
    pub fn as_der(&self) -> &[u8] {
        &self.der_data
    }

    /// Fixed-width `r || s`, each component left-padded to the curve size
    pub fn to_raw(&self) -> CryptoResult<Vec<u8>> {
        let ecdsa_sig = OpenSslEcdsaSig::from_der(&self.der_data)?;
        let width = self.curve.key_size() as i32;

        let mut combined = ecdsa_sig.r().to_vec_padded(width)?;
        combined.extend_from_slice(&ecdsa_sig.s().to_vec_padded(width)?);
        Ok(combined)
    }

    /// Convert DER encoded signature to hex string representation
    pub fn to_hex(&self) -> String {
        hex::encode(&self.der_data)
    }
}

impl fmt::Debug for EcdsaSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdsaSig")
            .field("curve", &self.curve)
            .field("size", &self.der_data.len())
            .field("hex", &self.to_hex())
            .finish()
    }
}

/// ECDSA key pair for signature operations
#[derive(Clone)]
pub struct EcdsaKeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl EcdsaKeyPair {
    /// Generate a new ECDSA key pair
    pub fn generate(curve: Curve) -> CryptoResult<Self> {
        Self::from_private_key(PrivateKey::generate(curve)?)
    }

    /// Create from existing private key
    pub fn from_private_key(private_key: PrivateKey) -> CryptoResult<Self> {
        let public_key = private_key.public_key()?;
        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// Sign data with this key pair and return the signature
    pub fn sign(&self, data: impl AsRef<[u8]>, hash_alg: HashAlg) -> CryptoResult<EcdsaSig> {
        sign(&self.private_key, data, hash_alg)
    }

    /// Get the public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Get the curve used by this key pair
    pub fn curve(&self) -> Curve {
        self.private_key.curve()
    }
}

impl fmt::Debug for EcdsaKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdsaKeyPair")
            .field("curve", &self.curve())
            .field("private_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Sign data with a private key and return the signature
pub fn sign(
    private_key: &PrivateKey,
    data: impl AsRef<[u8]>,
    hash_alg: HashAlg,
) -> CryptoResult<EcdsaSig> {
    let mut signer = Signer::new(hash_alg.into(), private_key.as_openssl_pkey())?;
    signer.update(data.as_ref())?;
    let signature_der = signer.sign_to_vec()?;

    EcdsaSig::from_der(private_key.curve(), signature_der)
}

/// Verify a signature against data using a public key
pub fn verify(
    public_key: &PublicKey,
    data: impl AsRef<[u8]>,
    signature: &EcdsaSig,
    hash_alg: HashAlg,
) -> CryptoResult<bool> {
    if signature.curve() != public_key.curve() {
        return Err(Error::Invalid(
            "Signature curve does not match key curve".to_string(),
        ));
    }

    let mut verifier = Verifier::new(hash_alg.into(), public_key.as_openssl_pkey())?;
    verifier.update(data.as_ref())?;
    Ok(verifier.verify(signature.as_der())?)
}
