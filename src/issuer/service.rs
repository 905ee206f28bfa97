use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

use super::credential::{
    CredentialBundle, DEFAULT_DISTRIBUTION_POINT, DetachedStatusClaims, EntryOptions,
    MockCredentialClaims, credential_id_of, new_credential_id,
};
use super::errors::IssuerResult;
use crate::dsl::seed::derive_seed;
use crate::dsl::{
    CredentialId, Period, PrivateMetadata, PublicationEngine, RevocationRegistry, SecretStore,
    SignedPublication, StatusMap,
};
use crate::storage::Repository;

/// The issuer context.
///
/// Owns the registry, the publication engine and the repository both are
/// persisted to. Every mutation follows the same order under one lock:
/// persist the new map, apply it in memory, then publish. A failed write
/// leaves the registry untouched.
pub struct Issuer {
    secrets: Arc<SecretStore>,
    registry: RevocationRegistry,
    engine: PublicationEngine,
    repository: Arc<dyn Repository>,
    latest: RwLock<Option<SignedPublication>>,
    op_lock: Mutex<()>,
    distribution_point: String,
}

impl Issuer {
    /// Restore the registry and latest publication from `repository`,
    /// creating an empty registry on first start.
    pub async fn load(
        secrets: Arc<SecretStore>,
        repository: Arc<dyn Repository>,
        period: Period,
    ) -> IssuerResult<Self> {
        let map = match repository.load_registry().await? {
            Some(map) => {
                info!("Loaded registry with {} entries", map.len());
                map
            }
            None => {
                info!("No registry found, starting with an empty one");
                let map = StatusMap::new();
                repository.save_registry(&map).await?;
                map
            }
        };

        let latest = match repository.load_publication().await? {
            Some(envelope) => match envelope.into_publication() {
                Ok(publication) => Some(publication),
                Err(e) => {
                    warn!("Ignoring stored publication: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            engine: PublicationEngine::new(Arc::clone(&secrets), period),
            secrets,
            registry: RevocationRegistry::from_map(map),
            repository,
            latest: RwLock::new(latest),
            op_lock: Mutex::new(()),
            distribution_point: DEFAULT_DISTRIBUTION_POINT.to_string(),
        })
    }

    /// Status distribution point written into issued credentials
    pub fn with_distribution_point(mut self, distribution_point: impl Into<String>) -> Self {
        self.distribution_point = distribution_point.into();
        self
    }

    pub fn secrets(&self) -> &SecretStore {
        &self.secrets
    }

    pub fn registry(&self) -> &RevocationRegistry {
        &self.registry
    }

    pub fn period(&self) -> Period {
        self.engine.period()
    }

    pub fn distribution_point(&self) -> &str {
        &self.distribution_point
    }

    /// Sign a mock credential for `subject` with a fresh `jti`. The
    /// credential is not tracked until an entry is created for it.
    pub fn issue_credential(&self, subject: &str) -> IssuerResult<(CredentialId, CredentialBundle)> {
        let jti = new_credential_id();
        let claims = MockCredentialClaims {
            sub: subject.to_string(),
            jti: jti.to_string(),
            sdb: self.distribution_point.clone(),
        };
        let jwt = self.secrets.sign(&claims)?;
        info!("Issued credential {}", jti);
        Ok((jti, CredentialBundle::new(jwt)))
    }

    /// Track the credential in `bundle`, attach its status material and
    /// republish at `now`.
    #[instrument(skip(self, bundle), fields(detached = options.detached.is_some()))]
    pub async fn create_entry(
        &self,
        bundle: &CredentialBundle,
        options: &EntryOptions,
        now: u64,
    ) -> IssuerResult<(CredentialId, CredentialBundle)> {
        let jti = credential_id_of(&bundle.jwt)?;

        let seed = derive_seed(self.secrets.master_secret(), &jti);
        let metadata = PrivateMetadata::new(jti.clone(), seed);
        let private_metadata = self.secrets.sign(&metadata.to_claims())?;

        let detached_dsl_jwt = match &options.detached {
            Some(detached) => Some(self.secrets.sign(&DetachedStatusClaims {
                sub: jti.to_string(),
                sdb: detached.distribution_point.clone(),
            })?),
            None => None,
        };

        self.track(jti.clone(), now).await?;

        let updated = CredentialBundle {
            jwt: bundle.jwt.clone(),
            private_metadata: Some(private_metadata),
            detached_dsl_jwt,
        };
        Ok((jti, updated))
    }

    /// Start tracking `id` as valid and republish. Tracking an id twice only
    /// republishes.
    pub async fn track(&self, id: CredentialId, now: u64) -> IssuerResult<SignedPublication> {
        let _guard = self.op_lock.lock().await;

        let mut next = self.registry.snapshot().await;
        if next.track(id.clone()) {
            self.repository.save_registry(&next).await?;
            self.registry.track(id).await;
        }
        self.publish_locked(now).await
    }

    /// Revoke a tracked credential and republish
    #[instrument(skip(self))]
    pub async fn revoke(&self, id: &CredentialId, now: u64) -> IssuerResult<SignedPublication> {
        let _guard = self.op_lock.lock().await;

        let mut next = self.registry.snapshot().await;
        next.revoke(id)?;
        self.repository.save_registry(&next).await?;
        self.registry.revoke(id).await?;
        info!("Revoked credential {}", id);

        self.publish_locked(now).await
    }

    /// Recompute, sign and store a publication for `now`
    pub async fn publish(&self, now: u64) -> IssuerResult<SignedPublication> {
        let _guard = self.op_lock.lock().await;
        self.publish_locked(now).await
    }

    /// The most recent publication, if any has been made or loaded
    pub async fn latest_publication(&self) -> Option<SignedPublication> {
        self.latest.read().await.clone()
    }

    async fn publish_locked(&self, now: u64) -> IssuerResult<SignedPublication> {
        let publication = self.engine.publish(&self.registry, now).await?;
        self.repository
            .save_publication(&publication.to_envelope())
            .await?;
        *self.latest.write().await = Some(publication.clone());
        Ok(publication)
    }
}
