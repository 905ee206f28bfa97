//! Pretty-printed JSON files with atomic replacement.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;
use tracing::debug;

use super::{StorageError, StorageResult};

/// Write `value` to `path`.
///
/// The data goes to a sibling temporary file first and is then renamed over
/// the target, so readers see either the old or the new content.
pub async fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io(parent, e))?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, &bytes)
        .await
        .map_err(|e| StorageError::io(&tmp, e))?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(StorageError::io(path, e));
    }

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Read and parse `path`
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> StorageResult<T> {
    let bytes = fs::read(path).await.map_err(|e| StorageError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Like [`load_json`], but a missing file is `Ok(None)`
pub async fn load_json_opt<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    match fs::try_exists(path).await {
        Ok(true) => load_json(path).await.map(Some),
        Ok(false) => Ok(None),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
