use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::errors::{DslError, DslResult};
use super::identifier::encode;
use super::registry::{RevocationRegistry, StatusMap};
use super::secrets::SecretStore;
use super::seed::derive_seed;
use super::token::rotate_token;
use super::types::{Period, RevocationIdentifier};
use crate::crypto::jws::{self, DecodedJws};

/// `typ` claim of every publication
pub const PUBLICATION_TYPE: &str = "dsl/v1";

/// Claims of a signed status list publication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationClaims {
    pub typ: String,
    /// Hex SHA-256 JWK thumbprint of the issuer key
    pub iss: String,
    pub nbf: u64,
    pub exp: u64,
    /// When the next publication is due
    pub nxt: u64,
    /// Shuffled revocation identifiers, one per tracked credential
    pub sid: Vec<RevocationIdentifier>,
}

impl PublicationClaims {
    /// Whether `unix_time` falls inside `[nbf, exp]`
    pub fn covers(&self, unix_time: u64) -> bool {
        self.nbf <= unix_time && unix_time <= self.exp
    }
}

/// A publication together with its compact JWS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPublication {
    compact: String,
    claims: PublicationClaims,
}

impl SignedPublication {
    /// Parse a compact JWS. The signature is not checked here; call
    /// [`SignedPublication::verify_signature`] before trusting the claims.
    pub fn from_compact(compact: impl Into<String>) -> DslResult<Self> {
        let compact = compact.into();
        let decoded: DecodedJws<PublicationClaims> = jws::decode_unverified(&compact)
            .map_err(|e| DslError::Input(format!("not a status list publication: {e}")))?;

        if decoded.claims.typ != PUBLICATION_TYPE {
            return Err(DslError::InvalidPublication(format!(
                "unexpected typ {:?}",
                decoded.claims.typ
            )));
        }

        Ok(Self {
            compact,
            claims: decoded.claims,
        })
    }

    /// Check the signature against the embedded issuer key and require that
    /// `iss` is that key's thumbprint. With `pinned_issuer`, the thumbprint
    /// must also match the caller's expectation.
    pub fn verify_signature(&self, pinned_issuer: Option<&str>) -> DslResult<()> {
        let decoded: DecodedJws<PublicationClaims> = jws::decode_unverified(&self.compact)?;
        let jwk = match pinned_issuer {
            Some(thumbprint) => decoded.verify_pinned(thumbprint),
            None => decoded.verify_embedded(),
        }
        .map_err(|e| DslError::InvalidPublication(e.to_string()))?;

        if !jwk.thumbprint_hex()?.eq_ignore_ascii_case(&self.claims.iss) {
            return Err(DslError::InvalidPublication(
                "iss does not match the signing key".to_string(),
            ));
        }
        Ok(())
    }

    pub fn claims(&self) -> &PublicationClaims {
        &self.claims
    }

    pub fn compact(&self) -> &str {
        &self.compact
    }

    /// Storage envelope `{ dsl_jwt, nbf }`
    pub fn to_envelope(&self) -> PublicationEnvelope {
        PublicationEnvelope {
            dsl_jwt: self.compact.clone(),
            nbf: self.claims.nbf,
        }
    }
}

/// The form in which publications are written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationEnvelope {
    pub dsl_jwt: String,
    pub nbf: u64,
}

impl PublicationEnvelope {
    pub fn into_publication(self) -> DslResult<SignedPublication> {
        let publication = SignedPublication::from_compact(self.dsl_jwt)?;
        if publication.claims.nbf != self.nbf {
            return Err(DslError::InvalidPublication(
                "envelope nbf does not match the signed nbf".to_string(),
            ));
        }
        Ok(publication)
    }
}

/// Computes and signs the identifier set for a registry state
#[derive(Debug, Clone)]
pub struct PublicationEngine {
    secrets: Arc<SecretStore>,
    period: Period,
}

impl PublicationEngine {
    pub fn new(secrets: Arc<SecretStore>, period: Period) -> Self {
        Self { secrets, period }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// Snapshot `registry` and publish it at `now`
    pub async fn publish(
        &self,
        registry: &RevocationRegistry,
        now: u64,
    ) -> DslResult<SignedPublication> {
        let snapshot = registry.snapshot().await;
        self.publish_snapshot(&snapshot, now)
    }

    /// Sign a publication for an already taken snapshot
    pub fn publish_snapshot(&self, snapshot: &StatusMap, now: u64) -> DslResult<SignedPublication> {
        let sid = self.compute_identifiers(snapshot, now)?;
        let epoch = self.period.epoch_at(now);
        let next = epoch.next_start(self.period);

        let claims = PublicationClaims {
            typ: PUBLICATION_TYPE.to_string(),
            iss: self.secrets.thumbprint().to_string(),
            nbf: now,
            exp: next.saturating_sub(1),
            nxt: next,
            sid,
        };
        let compact = self.secrets.sign(&claims)?;

        info!(
            "Published {} identifiers for epoch {} (valid until {})",
            claims.sid.len(),
            epoch,
            claims.exp
        );
        Ok(SignedPublication { compact, claims })
    }

    /// One identifier per entry, in uniformly random order.
    ///
    /// The shuffle keeps positions from lining up with map order across
    /// successive publications.
    pub fn compute_identifiers(
        &self,
        snapshot: &StatusMap,
        now: u64,
    ) -> DslResult<Vec<RevocationIdentifier>> {
        let master = self.secrets.master_secret();
        let mut identifiers = snapshot
            .iter()
            .map(|(id, status)| -> DslResult<RevocationIdentifier> {
                let seed = derive_seed(master, id);
                let (token, _) = rotate_token(&seed, now, self.period)?;
                Ok(encode(id, &token, status))
            })
            .collect::<DslResult<Vec<_>>>()?;

        identifiers.shuffle(&mut rand::rng());
        debug!("Computed {} revocation identifiers", identifiers.len());
        Ok(identifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::identifier::candidates;
    use crate::dsl::types::{CredentialId, CredentialStatus};

    fn engine() -> PublicationEngine {
        let secrets = Arc::new(SecretStore::generate().unwrap());
        PublicationEngine::new(secrets, Period::from_secs(60).unwrap())
    }

    fn map_of(ids: &[&str]) -> StatusMap {
        let mut map = StatusMap::new();
        for id in ids {
            map.track(CredentialId::from(*id));
        }
        map
    }

    #[test]
    fn test_one_identifier_per_entry() {
        let engine = engine();
        let mut map = map_of(&["a", "b", "c"]);
        map.revoke(&CredentialId::from("b")).unwrap();

        let sid = engine.compute_identifiers(&map, 1_700_000_000).unwrap();
        assert_eq!(sid.len(), 3);

        let seed = derive_seed(engine.secrets.master_secret(), &CredentialId::from("b"));
        let (token, _) = rotate_token(&seed, 1_700_000_000, engine.period()).unwrap();
        let (valid, revoked) = candidates(&CredentialId::from("b"), &token);
        assert!(sid.contains(&revoked));
        assert!(!sid.contains(&valid));
    }

    #[test]
    fn test_empty_registry_publishes_empty_set() {
        let publication = engine()
            .publish_snapshot(&StatusMap::new(), 1_700_000_000)
            .unwrap();
        assert!(publication.claims().sid.is_empty());
    }

    #[test]
    fn test_header_window() {
        let engine = engine();
        let now = 1_700_000_030;
        let publication = engine.publish_snapshot(&map_of(&["a"]), now).unwrap();
        let claims = publication.claims();

        let next = now - now % 60 + 60;
        assert_eq!(claims.typ, PUBLICATION_TYPE);
        assert_eq!(claims.iss, engine.secrets.thumbprint());
        assert_eq!(claims.nbf, now);
        assert_eq!(claims.nxt, next);
        assert_eq!(claims.exp, next - 1);
        assert!(claims.covers(now));
        assert!(claims.covers(next - 1));
        assert!(!claims.covers(next));
    }

    #[test]
    fn test_signature_and_iss_are_checked() {
        let engine = engine();
        let publication = engine.publish_snapshot(&map_of(&["a"]), 1_700_000_000).unwrap();
        publication.verify_signature(None).unwrap();
        publication
            .verify_signature(Some(engine.secrets.thumbprint()))
            .unwrap();

        let stranger = SecretStore::generate().unwrap();
        assert!(matches!(
            publication.verify_signature(Some(stranger.thumbprint())),
            Err(DslError::InvalidPublication(_))
        ));
    }

    #[test]
    fn test_iss_must_match_signing_key() {
        let engine = engine();
        let stranger = SecretStore::generate().unwrap();

        // Claims naming one issuer but signed by another
        let claims = PublicationClaims {
            typ: PUBLICATION_TYPE.to_string(),
            iss: engine.secrets.thumbprint().to_string(),
            nbf: 0,
            exp: 59,
            nxt: 60,
            sid: Vec::new(),
        };
        let forged = SignedPublication::from_compact(stranger.sign(&claims).unwrap()).unwrap();
        assert!(matches!(
            forged.verify_signature(None),
            Err(DslError::InvalidPublication(_))
        ));
    }

    #[test]
    fn test_rejects_foreign_typ() {
        let secrets = SecretStore::generate().unwrap();
        let token = secrets
            .sign(&serde_json::json!({
                "typ": "other", "iss": "x", "nbf": 0, "exp": 0, "nxt": 0, "sid": []
            }))
            .unwrap();
        assert!(matches!(
            SignedPublication::from_compact(token),
            Err(DslError::InvalidPublication(_))
        ));
    }

    #[test]
    fn test_envelope_round_trip() {
        let publication = engine()
            .publish_snapshot(&map_of(&["a", "b"]), 1_700_000_000)
            .unwrap();
        let json = serde_json::to_string(&publication.to_envelope()).unwrap();
        let envelope: PublicationEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(envelope.into_publication().unwrap(), publication);
    }

    #[tokio::test]
    async fn test_publish_reads_registry() {
        let engine = engine();
        let registry = RevocationRegistry::new();
        registry.track(CredentialId::from("a")).await;
        registry.track(CredentialId::from("b")).await;

        let publication = engine.publish(&registry, 1_700_000_000).await.unwrap();
        assert_eq!(publication.claims().sid.len(), 2);
        assert_eq!(
            registry.status(&CredentialId::from("a")).await,
            Some(CredentialStatus::Valid)
        );
    }

    /// Across many publications of an unchanged registry, the slot holding a
    /// given credential's identifier must be uniformly distributed.
    #[test]
    fn test_positions_are_uniform() {
        const SLOTS: usize = 8;
        const RUNS: usize = 4000;

        let engine = engine();
        let ids: Vec<String> = (0..SLOTS).map(|i| format!("cred-{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let map = map_of(&refs);
        let now = 1_700_000_000;

        let target = CredentialId::from("cred-0");
        let seed = derive_seed(engine.secrets.master_secret(), &target);
        let (token, _) = rotate_token(&seed, now, engine.period()).unwrap();
        let (needle, _) = candidates(&target, &token);

        let mut counts = [0usize; SLOTS];
        for _ in 0..RUNS {
            let sid = engine.compute_identifiers(&map, now).unwrap();
            let position = sid.iter().position(|id| *id == needle).unwrap();
            counts[position] += 1;
        }

        let expected = RUNS as f64 / SLOTS as f64;
        let chi_square: f64 = counts
            .iter()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();

        // 7 degrees of freedom; 24.32 is the p = 0.001 critical value
        assert!(chi_square < 24.32, "chi-square {chi_square}, counts {counts:?}");
    }
}
