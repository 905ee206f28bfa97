use crate::crypto::curves::Curve;
use crate::crypto::errors::{CryptoResult, Error};
use openssl::bn::BigNumContext;
use openssl::ec::{EcGroup, EcKey, EcPoint, PointConversionForm as Form};
use openssl::pkey::{PKey, Private, Public};
use secrecy::{ExposeSecret, SecretSlice};
use std::fmt;

/// Secure wrapper for sensitive byte data that zeroizes on drop
#[derive(Debug, Clone)]
pub struct SecureBytes(SecretSlice<u8>);

impl SecureBytes {
    /// Create new SecureBytes
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self(SecretSlice::new(data.into().into()))
    }

    /// Expose the secret data
    pub fn expose_secret(&self) -> &[u8] {
        self.0.expose_secret()
    }
}

/// An EC private key used for issuer signatures
#[derive(Clone)]
pub struct PrivateKey {
    curve: Curve,
    key_data: SecureBytes,
    openssl_key: PKey<Private>,
}

impl PrivateKey {
    /// Generate a new random private key with the given curve
    pub fn generate(curve: Curve) -> CryptoResult<Self> {
        let group: EcGroup = curve.try_into()?;
        let ec_key = EcKey::generate(&group)?;
        let pkey = PKey::from_ec_key(ec_key)?;
        Self::pk_to_private(pkey)
    }

    /// Import key from PKCS#8 PEM format
    pub fn from_pkcs8_pem(pem_bytes: impl AsRef<[u8]>) -> CryptoResult<Self> {
        let pkey = PKey::private_key_from_pem(pem_bytes.as_ref())?;
        Self::pk_to_private(pkey)
    }

    fn pk_to_private(pk: PKey<Private>) -> CryptoResult<Self> {
        let ec_key = pk.ec_key()?;
        let curve: Curve = ec_key.group().try_into()?;

        // Left-pad the scalar so equal keys always expose equal bytes
        let key_bytes = ec_key.private_key().to_vec_padded(curve.key_size() as i32)?;

        Ok(Self {
            curve,
            key_data: SecureBytes::new(key_bytes),
            openssl_key: pk,
        })
    }

    /// Get the curve used by this key
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// Get the raw, fixed-width private scalar
    pub fn as_bytes(&self) -> &[u8] {
        self.key_data.expose_secret()
    }

    /// Get the OpenSSL PKey
    pub fn as_openssl_pkey(&self) -> &PKey<Private> {
        &self.openssl_key
    }

    /// Derive the corresponding public key
    pub fn public_key(&self) -> CryptoResult<PublicKey> {
        let ec_key = self.openssl_key.ec_key()?;
        let mut ctx = BigNumContext::new()?;
        let point_bytes =
            ec_key
                .public_key()
                .to_bytes(ec_key.group(), Form::UNCOMPRESSED, &mut ctx)?;

        PublicKey::from_bytes(self.curve, &point_bytes)
    }

    /// Export key in PKCS#8 PEM format
    pub fn to_pkcs8_pem(&self) -> CryptoResult<String> {
        let pem_bytes = self.openssl_key.private_key_to_pem_pkcs8()?;
        Ok(String::from_utf8_lossy(&pem_bytes).to_string())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("curve", &self.curve)
            .field("key_data", &"[REDACTED]")
            .finish()
    }
}

/// An EC public key, kept in uncompressed point form
#[derive(Clone, Debug)]
pub struct PublicKey {
    curve: Curve,
    point_data: Vec<u8>,
    openssl_key: PKey<Public>,
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.curve == other.curve && self.point_data == other.point_data
    }
}

impl Eq for PublicKey {}

impl PublicKey {
    /// Create a public key from point bytes (uncompressed or compressed format)
    pub fn from_bytes(curve: Curve, point_bytes: impl AsRef<[u8]>) -> CryptoResult<Self> {
        let bytes = point_bytes.as_ref();
        let len = bytes.len();
        if len != curve.uncompressed_point_size() && len != curve.coordinate_size() + 1 {
            return Err(Error::Invalid(format!(
                "Invalid point size: expected {} or {} bytes, got {len}",
                curve.uncompressed_point_size(),
                curve.coordinate_size() + 1
            )));
        }
        if !matches!(bytes[0], 0x02..=0x04) {
            return Err(Error::Invalid(
                "Point must be in correct uncompressed or compressed format".to_string(),
            ));
        }

        let group: EcGroup = curve.try_into()?;
        let mut ctx = BigNumContext::new()?;
        let point = EcPoint::from_bytes(&group, bytes, &mut ctx)?;
        let uncompressed = point.to_bytes(&group, Form::UNCOMPRESSED, &mut ctx)?;

        let ec_key = EcKey::from_public_key(&group, &point)?;
        ec_key.check_key()?;
        let pkey = PKey::from_ec_key(ec_key)?;

        Ok(Self {
            curve,
            point_data: uncompressed,
            openssl_key: pkey,
        })
    }

    /// Create a public key from its affine coordinates, as carried in a JWK
    pub fn from_coordinates(curve: Curve, x: &[u8], y: &[u8]) -> CryptoResult<Self> {
        let size = curve.coordinate_size();
        if x.len() != size || y.len() != size {
            return Err(Error::Invalid(format!(
                "Coordinates must be {size} bytes each"
            )));
        }

        let mut point = Vec::with_capacity(curve.uncompressed_point_size());
        point.push(0x04);
        point.extend_from_slice(x);
        point.extend_from_slice(y);
        Self::from_bytes(curve, point)
    }

    /// Get the curve used by this key
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// Get the OpenSSL PKey of this public key
    pub fn as_openssl_pkey(&self) -> &PKey<Public> {
        &self.openssl_key
    }

    /// Get the X coordinate of the point
    pub fn x_coordinate(&self) -> &[u8] {
        // The point data is always in uncompressed format
        &self.point_data[1..1 + self.curve.coordinate_size()]
    }

    /// Get the Y coordinate of the point
    pub fn y_coordinate(&self) -> &[u8] {
        let coord_size = self.curve.coordinate_size();
        &self.point_data[1 + coord_size..1 + 2 * coord_size]
    }
}
