use super::types::{CredentialId, CredentialStatus, RevocationIdentifier, Token};
use crate::crypto::sha256_concat;

/// Encode a credential's status for one epoch.
///
/// `base = SHA256(token ‖ SHA256(jti))`; a valid credential publishes `base`,
/// a revoked one `SHA256(base)`. Empty identifiers are hashed like any other.
pub fn encode(
    credential_id: &CredentialId,
    token: &Token,
    status: CredentialStatus,
) -> RevocationIdentifier {
    let base = sha256_concat(&[token.as_bytes(), &credential_id.digest()]);
    match status {
        CredentialStatus::Valid => RevocationIdentifier::from_bytes(base),
        CredentialStatus::Revoked => RevocationIdentifier::from_bytes(sha256_concat(&[&base])),
    }
}

/// Both encodings for a token, in (valid, revoked) order
pub fn candidates(
    credential_id: &CredentialId,
    token: &Token,
) -> (RevocationIdentifier, RevocationIdentifier) {
    let valid = encode(credential_id, token, CredentialStatus::Valid);
    let revoked = RevocationIdentifier::from_bytes(sha256_concat(&[valid.as_bytes()]));
    (valid, revoked)
}
