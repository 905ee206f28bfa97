//! Dynamic status list.
//!
//! Instead of a list of revoked credentials the issuer publishes one
//! pseudorandom identifier per tracked credential. Each identifier is derived
//! from a per-credential seed and the current epoch, and its encoding carries
//! the validity bit. Only a holder of the seed can tell which identifier is
//! theirs and what it says.

mod errors;
pub mod holder;
pub mod identifier;
pub mod publication;
pub mod registry;
mod secrets;
pub mod seed;
pub mod token;
mod types;
pub mod verifier;

pub use errors::{DslError, DslResult};
pub use holder::{HolderProof, HolderProofBuilder, PrivateMetadata, PrivateMetadataClaims};
pub use publication::{
    PUBLICATION_TYPE, PublicationClaims, PublicationEngine, PublicationEnvelope, SignedPublication,
};
pub use registry::{RevocationRegistry, StatusMap};
pub use secrets::SecretStore;
pub use types::{
    CredentialId, CredentialStatus, Epoch, MasterSecret, Period, RevocationIdentifier, Seed, Token,
    unix_now,
};
pub use verifier::Verifier;
