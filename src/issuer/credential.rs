use serde::{Deserialize, Serialize};

use crate::crypto::{generate_random_bytes, jws};
use crate::dsl::{CredentialId, DslError, DslResult};

/// Status distribution point written into credentials when none is configured
pub const DEFAULT_DISTRIBUTION_POINT: &str = "http://localhost:4321/sdb/1";

/// A credential as handed to the holder, plus its status material once
/// an entry has been created for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBundle {
    pub jwt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detached_dsl_jwt: Option<String>,
}

impl CredentialBundle {
    pub fn new(jwt: impl Into<String>) -> Self {
        Self {
            jwt: jwt.into(),
            ..Default::default()
        }
    }

    /// Private metadata JWS, treating an empty string as absent
    pub fn private_metadata(&self) -> Option<&str> {
        self.private_metadata.as_deref().filter(|m| !m.is_empty())
    }
}

/// Claims of the mock credential produced by `issue`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockCredentialClaims {
    pub sub: String,
    pub jti: String,
    /// Status distribution point
    pub sdb: String,
}

/// Claims of a detached status token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachedStatusClaims {
    pub sub: String,
    pub sdb: String,
}

/// Request for a separately signed status token pointing at the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedStatus {
    pub distribution_point: String,
}

/// What to produce besides the private metadata when creating an entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    pub detached: Option<DetachedStatus>,
}

impl EntryOptions {
    /// Private metadata only
    pub fn inline() -> Self {
        Self::default()
    }

    /// Private metadata and a detached status token
    pub fn detached(distribution_point: impl Into<String>) -> Self {
        Self {
            detached: Some(DetachedStatus {
                distribution_point: distribution_point.into(),
            }),
        }
    }
}

/// Fresh random credential identifier, 16 random bytes in hex
pub fn new_credential_id() -> CredentialId {
    CredentialId::new(hex::encode(generate_random_bytes(16)))
}

/// Read the `jti` claim of a compact credential without verifying it
pub fn credential_id_of(jwt: &str) -> DslResult<CredentialId> {
    let (_, claims, _) = jws::decode_segments(jwt)
        .map_err(|e| DslError::Input(format!("credential is not a JWT: {e}")))?;
    claims
        .get("jti")
        .and_then(|v| v.as_str())
        .filter(|jti| !jti.is_empty())
        .map(CredentialId::from)
        .ok_or_else(|| DslError::Input("credential has no jti claim".to_string()))
}
