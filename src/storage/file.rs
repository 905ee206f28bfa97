use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::json::{load_json_opt, save_json};
use super::{Repository, StorageResult};
use crate::dsl::{PublicationEnvelope, StatusMap};

/// JSON files in a data directory
#[derive(Debug, Clone)]
pub struct FileRepository {
    registry_path: PathBuf,
    publication_path: PathBuf,
}

impl FileRepository {
    pub fn new(registry_path: impl Into<PathBuf>, publication_path: impl Into<PathBuf>) -> Self {
        Self {
            registry_path: registry_path.into(),
            publication_path: publication_path.into(),
        }
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    pub fn publication_path(&self) -> &Path {
        &self.publication_path
    }
}

#[async_trait]
impl Repository for FileRepository {
    async fn load_registry(&self) -> StorageResult<Option<StatusMap>> {
        load_json_opt(&self.registry_path).await
    }

    async fn save_registry(&self, map: &StatusMap) -> StorageResult<()> {
        save_json(&self.registry_path, map).await
    }

    async fn save_publication(&self, envelope: &PublicationEnvelope) -> StorageResult<()> {
        save_json(&self.publication_path, envelope).await
    }

    async fn load_publication(&self) -> StorageResult<Option<PublicationEnvelope>> {
        load_json_opt(&self.publication_path).await
    }
}
