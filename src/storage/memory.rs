use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Repository, StorageError, StorageResult};
use crate::dsl::{PublicationEnvelope, StatusMap};

/// An in-memory repository.
///
/// Useful for testing. Writes can be made to fail with
/// [`MemoryRepository::fail_writes`] to exercise commit failure paths.
#[derive(Debug, Default, Clone)]
pub struct MemoryRepository {
    registry: Arc<RwLock<Option<StatusMap>>>,
    publication: Arc<RwLock<Option<PublicationEnvelope>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (or succeed again)
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn load_registry(&self) -> StorageResult<Option<StatusMap>> {
        Ok(self.registry.read().await.clone())
    }

    async fn save_registry(&self, map: &StatusMap) -> StorageResult<()> {
        self.check_writable()?;
        *self.registry.write().await = Some(map.clone());
        Ok(())
    }

    async fn save_publication(&self, envelope: &PublicationEnvelope) -> StorageResult<()> {
        self.check_writable()?;
        *self.publication.write().await = Some(envelope.clone());
        Ok(())
    }

    async fn load_publication(&self) -> StorageResult<Option<PublicationEnvelope>> {
        Ok(self.publication.read().await.clone())
    }
}
