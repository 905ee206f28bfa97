use std::path::Path;
use std::sync::Arc;

use color_eyre::eyre::Context;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::Config;
use crate::crypto::{Curve, PrivateKey};
use crate::dsl::SecretStore;
use crate::issuer::Issuer;

/// Load the issuer key from `path`, generating and saving a P-256 key on
/// first start.
pub async fn load_or_generate_key(path: &Path) -> color_eyre::Result<PrivateKey> {
    if fs::try_exists(path).await.unwrap_or(false) {
        let pem = fs::read(path)
            .await
            .wrap_err_with(|| format!("Failed to read issuer key {}", path.display()))?;
        let key = PrivateKey::from_pkcs8_pem(&pem)
            .wrap_err_with(|| format!("Invalid issuer key {}", path.display()))?;
        tracing::debug!("Loaded issuer key from {}", path.display());
        return Ok(key);
    }

    tracing::info!("No issuer key at {}, generating one", path.display());
    let key = PrivateKey::generate(Curve::NistP256)?;
    write_private(path, key.to_pkcs8_pem()?.as_bytes())
        .await
        .wrap_err_with(|| format!("Failed to write issuer key {}", path.display()))?;
    Ok(key)
}

async fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

/// Build the issuer context described by `config`
pub async fn setup(config: &Config) -> color_eyre::Result<Arc<Issuer>> {
    let key = load_or_generate_key(&config.storage.key_path()).await?;
    let secrets = Arc::new(SecretStore::from_private_key(key)?);
    tracing::info!("Issuer thumbprint {}", secrets.thumbprint());

    let repository = Arc::new(config.storage.repository());
    let issuer = Issuer::load(secrets, repository, config.dsl.period()?)
        .await
        .wrap_err("Failed to load the status list registry")?
        .with_distribution_point(&config.dsl.distribution_point);

    Ok(Arc::new(issuer))
}
