//! Compact JWS (RFC 7515) with ECDSA signatures.
//!
//! Tokens are signed with the issuer's EC key and carry the public key as a
//! `jwk` protected header, so a holder or verifier can check a token without
//! any other key distribution. Callers that know the issuer's JWK thumbprint
//! should pin it with [`DecodedJws::verify_pinned`].

use crate::crypto::curves::Curve;
use crate::crypto::ecdsa::{self, EcdsaKeyPair, EcdsaSig};
use crate::crypto::errors::{CryptoResult, Error};
use crate::crypto::keys::PublicKey;
use crate::crypto::sha256_concat;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD as B64};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Public EC key in JWK form (RFC 7517/7518)
///
/// Fields are declared in lexicographic order so that the compact
/// serialization is also the RFC 7638 thumbprint input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub crv: String,
    pub kty: String,
    pub x: String,
    pub y: String,
}

impl Jwk {
    /// Build the JWK for an EC public key
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self {
            crv: public_key.curve().jwk_crv().to_string(),
            kty: "EC".to_string(),
            x: B64.encode(public_key.x_coordinate()),
            y: B64.encode(public_key.y_coordinate()),
        }
    }

    /// Turn the JWK back into a usable public key
    pub fn to_public_key(&self) -> CryptoResult<PublicKey> {
        if self.kty != "EC" {
            return Err(Error::Invalid(format!("Unsupported JWK kty: {}", self.kty)));
        }
        let curve = Curve::from_jwk_crv(&self.crv)?;
        let x = B64.decode(&self.x)?;
        let y = B64.decode(&self.y)?;
        PublicKey::from_coordinates(curve, &x, &y)
    }

    /// SHA-256 JWK thumbprint (RFC 7638)
    pub fn thumbprint(&self) -> CryptoResult<[u8; 32]> {
        let canonical = serde_json::to_vec(self)?;
        Ok(sha256_concat(&[&canonical]))
    }

    /// Hex encoded SHA-256 JWK thumbprint
    pub fn thumbprint_hex(&self) -> CryptoResult<String> {
        Ok(hex::encode(self.thumbprint()?))
    }
}

/// JWS protected header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwk: Option<Jwk>,
}

/// Sign `claims` and return the compact serialization
pub fn sign<T: Serialize>(key_pair: &EcdsaKeyPair, claims: &T) -> CryptoResult<String> {
    let curve = key_pair.curve();
    let header = JwsHeader {
        alg: curve.jws_alg().to_string(),
        typ: Some("JWT".to_string()),
        jwk: Some(Jwk::from_public_key(key_pair.public_key())),
    };

    let signing_input = format!(
        "{}.{}",
        B64.encode(serde_json::to_vec(&header)?),
        B64.encode(serde_json::to_vec(claims)?)
    );
    let signature = key_pair.sign(signing_input.as_bytes(), curve.hash_alg())?;

    Ok(format!("{signing_input}.{}", B64.encode(signature.to_raw()?)))
}

/// A parsed, not yet verified compact JWS
#[derive(Debug, Clone)]
pub struct DecodedJws<T> {
    pub header: JwsHeader,
    pub claims: T,
    signing_input: String,
    signature: Vec<u8>,
}

/// Split and decode a compact JWS without checking its signature
pub fn decode_unverified<T: DeserializeOwned>(compact: &str) -> CryptoResult<DecodedJws<T>> {
    let (header_b64, payload_b64, signature_b64) = split_compact(compact)?;

    let header: JwsHeader = serde_json::from_slice(&B64.decode(header_b64)?)?;
    let claims: T = serde_json::from_slice(&B64.decode(payload_b64)?)?;
    let signature = B64.decode(signature_b64)?;

    Ok(DecodedJws {
        header,
        claims,
        signing_input: format!("{header_b64}.{payload_b64}"),
        signature,
    })
}

/// Decode header and payload as generic JSON, for display purposes
pub fn decode_segments(compact: &str) -> CryptoResult<(serde_json::Value, serde_json::Value, String)> {
    let (header_b64, payload_b64, signature_b64) = split_compact(compact)?;
    let header = serde_json::from_slice(&B64.decode(header_b64)?)?;
    let payload = serde_json::from_slice(&B64.decode(payload_b64)?)?;
    Ok((header, payload, signature_b64.to_string()))
}

fn split_compact(compact: &str) -> CryptoResult<(&str, &str, &str)> {
    let mut parts = compact.trim().split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(p), Some(s), None) if !h.is_empty() && !p.is_empty() => Ok((h, p, s)),
        _ => Err(Error::MalformedJws(
            "expected three dot separated segments".to_string(),
        )),
    }
}

impl<T> DecodedJws<T> {
    /// Verify the signature with a known public key
    pub fn verify_with(&self, public_key: &PublicKey) -> CryptoResult<()> {
        let curve = public_key.curve();
        if self.header.alg != curve.jws_alg() {
            return Err(Error::MalformedJws(format!(
                "alg {} does not match key curve {curve}",
                self.header.alg
            )));
        }

        let signature = EcdsaSig::from_raw(curve, &self.signature)?;
        if ecdsa::verify(public_key, self.signing_input.as_bytes(), &signature, curve.hash_alg())? {
            Ok(())
        } else {
            Err(Error::BadSignature)
        }
    }

    /// Verify against the `jwk` carried in the protected header
    pub fn verify_embedded(&self) -> CryptoResult<Jwk> {
        let jwk = self
            .header
            .jwk
            .clone()
            .ok_or_else(|| Error::MalformedJws("missing jwk header".to_string()))?;
        self.verify_with(&jwk.to_public_key()?)?;
        Ok(jwk)
    }

    /// Verify against the embedded key and require its thumbprint to match
    pub fn verify_pinned(&self, thumbprint_hex: &str) -> CryptoResult<Jwk> {
        let jwk = self.verify_embedded()?;
        if !jwk.thumbprint_hex()?.eq_ignore_ascii_case(thumbprint_hex) {
            return Err(Error::BadSignature);
        }
        Ok(jwk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sign_and_verify_embedded() {
        let key_pair = EcdsaKeyPair::generate(Curve::NistP256).unwrap();
        let token = sign(&key_pair, &json!({"sub": "abc", "n": 1})).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded: DecodedJws<serde_json::Value> = decode_unverified(&token).unwrap();
        assert_eq!(decoded.header.alg, "ES256");
        assert_eq!(decoded.claims["sub"], "abc");

        let jwk = decoded.verify_embedded().unwrap();
        assert_eq!(jwk, Jwk::from_public_key(key_pair.public_key()));
        decoded.verify_with(key_pair.public_key()).unwrap();
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let key_pair = EcdsaKeyPair::generate(Curve::NistP256).unwrap();
        let token = sign(&key_pair, &json!({"sub": "abc"})).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let forged_payload = B64.encode(br#"{"sub":"mallory"}"#);
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        let decoded: DecodedJws<serde_json::Value> = decode_unverified(&forged).unwrap();
        assert!(matches!(decoded.verify_embedded(), Err(Error::BadSignature)));
    }

    #[test]
    fn test_pinning_rejects_other_issuer() {
        let issuer = EcdsaKeyPair::generate(Curve::NistP256).unwrap();
        let other = EcdsaKeyPair::generate(Curve::NistP256).unwrap();
        let token = sign(&other, &json!({})).unwrap();

        let pinned = Jwk::from_public_key(issuer.public_key())
            .thumbprint_hex()
            .unwrap();
        let decoded: DecodedJws<serde_json::Value> = decode_unverified(&token).unwrap();
        assert!(decoded.verify_pinned(&pinned).is_err());

        let own = Jwk::from_public_key(other.public_key()).thumbprint_hex().unwrap();
        assert!(decoded.verify_pinned(&own).is_ok());
    }

    #[test]
    fn test_rfc7638_thumbprint_input_order() {
        let jwk = Jwk {
            crv: "P-256".to_string(),
            kty: "EC".to_string(),
            x: "xx".to_string(),
            y: "yy".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&jwk).unwrap(),
            r#"{"crv":"P-256","kty":"EC","x":"xx","y":"yy"}"#
        );
        assert_eq!(jwk.thumbprint_hex().unwrap().len(), 64);
    }

    #[test]
    fn test_jwk_round_trip() {
        let key_pair = EcdsaKeyPair::generate(Curve::NistP384).unwrap();
        let jwk = Jwk::from_public_key(key_pair.public_key());
        assert_eq!(jwk.crv, "P-384");
        assert_eq!(&jwk.to_public_key().unwrap(), key_pair.public_key());
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(decode_segments("only.two").is_err());
        assert!(decode_segments("a.b.c.d").is_err());
        assert!(decode_unverified::<serde_json::Value>("!!.??.sig").is_err());
    }
}
