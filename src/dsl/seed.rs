use super::types::{CredentialId, MasterSecret, Seed};
use crate::crypto::sha256_concat;

/// Derive the seed of one credential: `SHA256(master ‖ SHA256(jti))`.
///
/// The holder never recomputes this; it receives the seed at issuance.
pub fn derive_seed(master: &MasterSecret, credential_id: &CredentialId) -> Seed {
    Seed::from_bytes(sha256_concat(&[master.expose(), &credential_id.digest()]))
}
