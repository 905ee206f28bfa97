use async_trait::async_trait;

use crate::dsl::{PublicationEnvelope, StatusMap};

mod errors;
mod file;
pub mod json;
mod memory;

pub use errors::StorageError;
pub use file::FileRepository;
pub use memory::MemoryRepository;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Durable home of the registry and the latest publication.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Loads the persisted registry, `None` if nothing has been saved yet.
    async fn load_registry(&self) -> StorageResult<Option<StatusMap>>;

    /// Replaces the persisted registry with `map`.
    ///
    /// Either the whole map is written or the previous copy is left intact.
    async fn save_registry(&self, map: &StatusMap) -> StorageResult<()>;

    /// Replaces the stored publication.
    async fn save_publication(&self, envelope: &PublicationEnvelope) -> StorageResult<()>;

    /// Loads the latest stored publication, if any.
    async fn load_publication(&self) -> StorageResult<Option<PublicationEnvelope>>;
}
