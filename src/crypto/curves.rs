use crate::crypto::HashAlg;
use crate::crypto::errors::{CryptoResult, Error};
use openssl::ec::{EcGroup, EcGroupRef};
use openssl::nid::Nid;
use std::fmt;

/// Elliptic curves usable for issuer signing keys
#[derive(Debug, Clone, Default, Copy, PartialEq, Eq)]
pub enum Curve {
    /// NIST P-256 (secp256r1), signs as ES256
    #[default]
    NistP256,
    /// NIST P-384 (secp384r1), signs as ES384
    NistP384,
}

impl Curve {
    /// Get the OpenSSL NID for this curve
    pub fn to_nid(self) -> Nid {
        match self {
            Curve::NistP256 => Nid::X9_62_PRIME256V1,
            Curve::NistP384 => Nid::SECP384R1,
        }
    }

    /// Create an OpenSSL EcGroup for this curve
    pub fn to_ec_group(self) -> CryptoResult<EcGroup> {
        Ok(EcGroup::from_curve_name(self.to_nid())?)
    }

    /// Get the key size in bytes for this curve
    pub fn key_size(self) -> usize {
        match self {
            Curve::NistP256 => 32,
            Curve::NistP384 => 48,
        }
    }

    /// Get the coordinate size in bytes
    pub fn coordinate_size(self) -> usize {
        self.key_size()
    }

    /// Get the uncompressed point size in bytes
    pub fn uncompressed_point_size(self) -> usize {
        1 + 2 * self.key_size()
    }

    /// Get the raw (r || s) signature size in bytes
    pub fn signature_size(self) -> usize {
        2 * self.key_size()
    }

    /// The `crv` member of a JWK for this curve (RFC 7518 §6.2.1.1)
    pub fn jwk_crv(self) -> &'static str {
        match self {
            Curve::NistP256 => "P-256",
            Curve::NistP384 => "P-384",
        }
    }

    /// Parse the `crv` member of a JWK
    pub fn from_jwk_crv(crv: &str) -> CryptoResult<Self> {
        match crv {
            "P-256" => Ok(Curve::NistP256),
            "P-384" => Ok(Curve::NistP384),
            _ => Err(Error::UnsupportedCurve(format!("Unknown JWK curve: {crv}"))),
        }
    }

    /// The JWS `alg` header value for ECDSA with this curve
    pub fn jws_alg(self) -> &'static str {
        match self {
            Curve::NistP256 => "ES256",
            Curve::NistP384 => "ES384",
        }
    }

    /// The digest paired with this curve in JWS
    pub fn hash_alg(self) -> HashAlg {
        match self {
            Curve::NistP256 => HashAlg::Sha256,
            Curve::NistP384 => HashAlg::Sha384,
        }
    }

    /// Get all supported curves
    pub fn all() -> &'static [Curve] {
        &[Curve::NistP256, Curve::NistP384]
    }
}

impl TryFrom<Curve> for EcGroup {
    type Error = Error;

    fn try_from(curve: Curve) -> Result<Self, Self::Error> {
        curve.to_ec_group()
    }
}

impl TryFrom<&EcGroupRef> for Curve {
    type Error = Error;

    fn try_from(group: &EcGroupRef) -> Result<Self, Self::Error> {
        match group.curve_name() {
            Some(Nid::X9_62_PRIME256V1) => Ok(Curve::NistP256),
            Some(Nid::SECP384R1) => Ok(Curve::NistP384),
            Some(nid) => Err(Error::UnsupportedCurve(format!("{nid:?}"))),
            None => Err(Error::UnsupportedCurve("unnamed curve".to_string())),
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Curve::NistP256 => "NIST P-256 (secp256r1)",
            Curve::NistP384 => "NIST P-384 (secp384r1)",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_properties() {
        for &curve in Curve::all() {
            let group = curve.to_ec_group().unwrap();
            assert_eq!(Curve::try_from(&*group).unwrap(), curve);
            assert_eq!(Curve::from_jwk_crv(curve.jwk_crv()).unwrap(), curve);
            assert_eq!(curve.signature_size(), 2 * curve.key_size());
        }
    }

    #[test]
    fn test_jws_algorithms() {
        assert_eq!(Curve::NistP256.jws_alg(), "ES256");
        assert_eq!(Curve::NistP384.jws_alg(), "ES384");
        assert_eq!(Curve::NistP256.hash_alg(), HashAlg::Sha256);
        assert!(Curve::from_jwk_crv("secp256k1").is_err());
    }
}
