use std::collections::HashSet;

use tracing::{debug, warn};

use super::errors::{DslError, DslResult};
use super::holder::HolderProof;
use super::identifier::candidates;
use super::publication::{PublicationClaims, SignedPublication};
use super::types::{CredentialStatus, RevocationIdentifier};

/// Membership checks against one publication
#[derive(Debug)]
pub struct Verifier<'a> {
    claims: &'a PublicationClaims,
    identifiers: HashSet<&'a RevocationIdentifier>,
}

impl<'a> Verifier<'a> {
    pub fn new(publication: &'a SignedPublication) -> Self {
        Self::from_claims(publication.claims())
    }

    pub fn from_claims(claims: &'a PublicationClaims) -> Self {
        Self {
            claims,
            identifiers: claims.sid.iter().collect(),
        }
    }

    /// Status of the credential behind `proof`.
    ///
    /// Both encodings are recomputed from the proof's token; the one found in
    /// the publication decides. The proof's own `sid` and hypothesis are not
    /// trusted.
    pub fn verify(&self, proof: &HolderProof) -> DslResult<CredentialStatus> {
        if !self.claims.covers(proof.iat) {
            warn!(
                "Proof time {} outside publication window [{}, {}]",
                proof.iat, self.claims.nbf, self.claims.exp
            );
        }

        let token = proof.token()?;
        let (valid, revoked) = candidates(&proof.jti, &token);

        let status = match (
            self.identifiers.contains(&valid),
            self.identifiers.contains(&revoked),
        ) {
            (true, false) => CredentialStatus::Valid,
            (false, true) => CredentialStatus::Revoked,
            (false, false) => return Err(DslError::IdentifierNotFound),
            (true, true) => return Err(DslError::AmbiguousResult),
        };

        debug!("Credential {} is {}", proof.jti, status);
        Ok(status)
    }
}

/// One-shot check of `proof` against `publication`
pub fn verify(publication: &SignedPublication, proof: &HolderProof) -> DslResult<CredentialStatus> {
    Verifier::new(publication).verify(proof)
}
