use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::errors::{DslError, DslResult};
use super::types::{CredentialId, CredentialStatus};

/// Credential id to validity bit (`true` = valid).
///
/// This is both the registry's in-memory table and its persisted JSON form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusMap(BTreeMap<CredentialId, bool>);

impl StatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id` as valid. Returns `false` when it was already tracked, in
    /// which case its status is left untouched.
    pub fn track(&mut self, id: CredentialId) -> bool {
        if self.0.contains_key(&id) {
            return false;
        }
        self.0.insert(id, true);
        true
    }

    /// Mark a tracked credential as revoked. Revoking twice is a no-op.
    pub fn revoke(&mut self, id: &CredentialId) -> DslResult<()> {
        match self.0.get_mut(id) {
            Some(valid) => {
                *valid = false;
                Ok(())
            }
            None => Err(DslError::NotFound(id.clone())),
        }
    }

    pub fn status(&self, id: &CredentialId) -> Option<CredentialStatus> {
        self.0.get(id).copied().map(CredentialStatus::from_valid_bit)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CredentialId, CredentialStatus)> {
        self.0
            .iter()
            .map(|(id, valid)| (id, CredentialStatus::from_valid_bit(*valid)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The shared, mutable table of tracked credentials.
///
/// The registry only mutates state; it never publishes on its own. Readers get
/// copies through [`RevocationRegistry::snapshot`] so that publication never
/// iterates the live map.
#[derive(Debug, Clone, Default)]
pub struct RevocationRegistry {
    entries: Arc<RwLock<StatusMap>>,
}

impl RevocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from a previously persisted map
    pub fn from_map(map: StatusMap) -> Self {
        Self {
            entries: Arc::new(RwLock::new(map)),
        }
    }

    /// Start tracking `id` as valid; idempotent
    pub async fn track(&self, id: CredentialId) -> bool {
        let inserted = self.entries.write().await.track(id.clone());
        if inserted {
            debug!("Tracking credential {}", id);
        } else {
            debug!("Credential {} already tracked", id);
        }
        inserted
    }

    /// Revoke a tracked credential
    pub async fn revoke(&self, id: &CredentialId) -> DslResult<()> {
        self.entries.write().await.revoke(id)?;
        debug!("Revoked credential {}", id);
        Ok(())
    }

    pub async fn status(&self, id: &CredentialId) -> Option<CredentialStatus> {
        self.entries.read().await.status(id)
    }

    /// Copy of the whole table, taken under the read lock
    pub async fn snapshot(&self) -> StatusMap {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
