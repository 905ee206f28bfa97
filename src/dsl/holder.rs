use serde::{Deserialize, Serialize};

use super::errors::{DslError, DslResult};
use super::identifier::encode;
use super::token::rotate_token;
use super::types::{CredentialId, CredentialStatus, Period, RevocationIdentifier, Seed, Token};
use crate::crypto::jws;

/// Claims of the private status metadata token handed to the holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMetadataClaims {
    /// Credential identifier
    pub sub: String,
    /// Hex encoded seed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

/// Seed material the holder received at issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateMetadata {
    pub credential_id: CredentialId,
    pub seed: Seed,
}

impl PrivateMetadata {
    pub fn new(credential_id: CredentialId, seed: Seed) -> Self {
        Self { credential_id, seed }
    }

    pub fn to_claims(&self) -> PrivateMetadataClaims {
        PrivateMetadataClaims {
            sub: self.credential_id.to_string(),
            seed: Some(self.seed.to_hex()),
        }
    }

    /// Read the metadata out of its compact JWS.
    ///
    /// The holder only needs the payload; the token is signed so that a
    /// wallet can check where it came from, which is not done here.
    pub fn from_jws(compact: &str) -> DslResult<Self> {
        let decoded = jws::decode_unverified::<PrivateMetadataClaims>(compact)
            .map_err(|e| DslError::Input(format!("private metadata: {e}")))?;
        let claims = decoded.claims;
        let seed = claims
            .seed
            .as_deref()
            .filter(|seed| !seed.is_empty())
            .ok_or(DslError::MissingMetadata)?;
        Ok(Self {
            seed: Seed::from_hex(seed)?,
            credential_id: CredentialId::from(claims.sub),
        })
    }
}

/// Holder-computed candidate identifier for one credential at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderProof {
    pub jti: CredentialId,
    /// Base64url token for the epoch containing `iat`
    pub token: String,
    pub sid: RevocationIdentifier,
    pub iat: u64,
    /// Validity hypothesis the identifier was encoded with
    pub revoked: bool,
}

impl HolderProof {
    pub fn token(&self) -> DslResult<Token> {
        Token::from_base64(&self.token)
    }

    pub fn claimed_status(&self) -> CredentialStatus {
        CredentialStatus::from_valid_bit(!self.revoked)
    }
}

/// Builds holder proofs. Needs nothing from the issuer beyond the period.
#[derive(Debug, Clone, Copy, Default)]
pub struct HolderProofBuilder {
    period: Period,
}

impl HolderProofBuilder {
    pub fn new(period: Period) -> Self {
        Self { period }
    }

    pub fn build(
        &self,
        metadata: &PrivateMetadata,
        at: u64,
        hypothesis: CredentialStatus,
    ) -> DslResult<HolderProof> {
        let (token, _) = rotate_token(&metadata.seed, at, self.period)?;
        let sid = encode(&metadata.credential_id, &token, hypothesis);

        Ok(HolderProof {
            jti: metadata.credential_id.clone(),
            token: token.to_base64(),
            sid,
            iat: at,
            revoked: !hypothesis.is_valid(),
        })
    }

    /// Build from the optional private metadata JWS of a credential bundle
    pub fn build_from_jws(
        &self,
        private_metadata: Option<&str>,
        at: u64,
        hypothesis: CredentialStatus,
    ) -> DslResult<HolderProof> {
        let compact = private_metadata
            .filter(|m| !m.is_empty())
            .ok_or(DslError::MissingMetadata)?;
        let metadata = PrivateMetadata::from_jws(compact)?;
        self.build(&metadata, at, hypothesis)
    }
}
