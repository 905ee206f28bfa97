use std::path::Path;
use std::sync::Arc;

use dsl_server::dsl::{Period, SecretStore};
use dsl_server::issuer::Issuer;
use dsl_server::storage::{FileRepository, Repository};

/// Start of an epoch for the default 60 second period
pub const T0: u64 = 1_700_000_040;

pub async fn spawn_issuer(repository: Arc<dyn Repository>) -> Issuer {
    let secrets = Arc::new(SecretStore::generate().expect("Failed to generate issuer key"));
    Issuer::load(secrets, repository, Period::default())
        .await
        .expect("Failed to load issuer")
}

#[allow(dead_code)]
pub fn file_repository(dir: &Path) -> FileRepository {
    FileRepository::new(dir.join("dsl-map.json"), dir.join("dsl.json"))
}
