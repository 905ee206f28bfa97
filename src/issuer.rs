mod credential;
mod errors;
mod scheduler;
mod service;

pub use credential::{
    CredentialBundle, DEFAULT_DISTRIBUTION_POINT, DetachedStatus, DetachedStatusClaims,
    EntryOptions, MockCredentialClaims, credential_id_of, new_credential_id,
};
pub use errors::{IssuerError, IssuerResult};
pub use scheduler::{PublicationScheduler, SchedulerConfig, SchedulerHandle};
pub use service::Issuer;
