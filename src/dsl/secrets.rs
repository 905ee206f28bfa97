use serde::Serialize;
use tracing::debug;

use super::errors::DslResult;
use super::types::MasterSecret;
use crate::crypto::ecdsa::EcdsaKeyPair;
use crate::crypto::jws::{self, Jwk};
use crate::crypto::kdf::{KdfParams, derive_key};
use crate::crypto::{self, Curve, PrivateKey, PublicKey};

const MASTER_SECRET_SALT: &[u8] = b"dsl/v1 master-secret salt";
const MASTER_SECRET_INFO: &[u8] = b"dsl/v1 master-secret";

/// Issuer key material: the signing key pair and the master secret derived
/// from it. Built once at startup and shared read-only afterwards.
#[derive(Debug)]
pub struct SecretStore {
    key_pair: EcdsaKeyPair,
    master_secret: MasterSecret,
    thumbprint: String,
}

impl SecretStore {
    /// Build the store around an existing issuer key
    pub fn from_private_key(private_key: PrivateKey) -> DslResult<Self> {
        let master_secret = derive_master_secret(&private_key)?;
        let key_pair = EcdsaKeyPair::from_private_key(private_key)?;
        let thumbprint = Jwk::from_public_key(key_pair.public_key()).thumbprint_hex()?;
        debug!("Issuer key loaded, thumbprint {}", thumbprint);

        Ok(Self {
            key_pair,
            master_secret,
            thumbprint,
        })
    }

    /// Build the store around a freshly generated P-256 key
    pub fn generate() -> DslResult<Self> {
        Self::from_private_key(PrivateKey::generate(Curve::NistP256)?)
    }

    pub fn master_secret(&self) -> &MasterSecret {
        &self.master_secret
    }

    pub fn public_key(&self) -> &PublicKey {
        self.key_pair.public_key()
    }

    /// Hex SHA-256 JWK thumbprint of the issuer key, the `iss` of publications
    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }

    /// Sign an arbitrary claim set as a compact JWS
    pub fn sign<T: Serialize>(&self, claims: &T) -> DslResult<String> {
        Ok(jws::sign(&self.key_pair, claims)?)
    }
}

/// HKDF-SHA256 over the private scalar with a fixed, labelled salt and info
fn derive_master_secret(private_key: &PrivateKey) -> DslResult<MasterSecret> {
    let params = KdfParams::new(32)
        .with_salt(MASTER_SECRET_SALT)
        .with_info(MASTER_SECRET_INFO);
    let okm = derive_key(private_key.as_bytes(), &params)?;
    master_secret_from_okm(okm.expose_secret())
}

/// Any length other than 32 means the KDF itself misbehaved
fn master_secret_from_okm(okm: &[u8]) -> DslResult<MasterSecret> {
    let bytes: [u8; 32] = okm.try_into().map_err(|_| crypto::Error::Kdf)?;
    Ok(MasterSecret::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::DslError;

    #[test]
    fn test_master_secret_is_deterministic_per_key() {
        let key = PrivateKey::generate(Curve::NistP256).unwrap();
        let pem = key.to_pkcs8_pem().unwrap();

        let first = SecretStore::from_private_key(key).unwrap();
        let second =
            SecretStore::from_private_key(PrivateKey::from_pkcs8_pem(&pem).unwrap()).unwrap();

        assert_eq!(first.master_secret().expose(), second.master_secret().expose());
        assert_eq!(first.thumbprint(), second.thumbprint());
    }

    #[test]
    fn test_master_secret_is_not_the_scalar() {
        let key = PrivateKey::generate(Curve::NistP256).unwrap();
        let scalar = key.as_bytes().to_vec();
        let store = SecretStore::from_private_key(key).unwrap();
        assert_ne!(store.master_secret().expose().as_slice(), scalar.as_slice());
    }

    #[test]
    fn test_distinct_keys_distinct_secrets() {
        let a = SecretStore::generate().unwrap();
        let b = SecretStore::generate().unwrap();
        assert_ne!(a.master_secret().expose(), b.master_secret().expose());
        assert_ne!(a.thumbprint(), b.thumbprint());
        assert_eq!(a.thumbprint().len(), 64);
    }

    #[test]
    fn test_short_kdf_output_is_fatal() {
        let err = master_secret_from_okm(&[7u8; 31]).unwrap_err();
        assert!(matches!(err, DslError::Crypto(crypto::Error::Kdf)));
        assert!(err.is_fatal());
        assert!(master_secret_from_okm(&[7u8; 32]).is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let store = SecretStore::generate().unwrap();
        let printed = format!("{store:?}");
        assert!(printed.contains("[REDACTED]"));
    }
}
