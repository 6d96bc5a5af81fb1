//! Downloading the artifacts produced by a finished run.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::client::{ClientError, RemoteTestClient};

/// Prefix of the temp directory the assets are written to.
pub const ASSETS_DIR_PREFIX: &str = "vdtesting_test_assets";

/// Environment output that receives the download directory.
pub const DOWNLOADED_FILES_DIR_ENV: &str = "VDTESTING_DOWNLOADED_FILES_DIR";

/// Creates a fresh, persistent temp directory for downloaded assets.
pub fn create_assets_dir() -> Result<PathBuf, ClientError> {
    let dir = tempfile::Builder::new()
        .prefix(ASSETS_DIR_PREFIX)
        .tempdir()
        .map_err(|e| ClientError::io(std::env::temp_dir(), e))?;
    Ok(dir.keep())
}

/// Resolves an asset name below `dir`, rejecting absolute paths and `..`.
pub fn asset_path(dir: &Path, name: &str) -> Result<PathBuf, ClientError> {
    let relative = Path::new(name);
    let safe = !name.is_empty()
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if !safe {
        return Err(ClientError::InvalidAssetName(name.to_string()));
    }
    Ok(dir.join(relative))
}

/// Lists the run's assets and downloads each into `dir`.
///
/// Returns the number of files written.
pub async fn download_assets<C>(client: &C, dir: &Path) -> Result<usize, ClientError>
where
    C: RemoteTestClient + ?Sized,
{
    let assets: BTreeMap<String, String> = client.list_assets().await?;
    debug!(count = assets.len(), "listed test assets");

    for (name, url) in &assets {
        let dest = asset_path(dir, name)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ClientError::io(parent, e))?;
        }
        client.download_file(url, &dest).await?;
        info!(file = %name, "downloaded test asset");
    }

    Ok(assets.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_path_accepts_nested_names() {
        let dir = Path::new("/tmp/assets");
        assert_eq!(
            asset_path(dir, "Pixel2-28-en-portrait/logcat").unwrap(),
            PathBuf::from("/tmp/assets/Pixel2-28-en-portrait/logcat")
        );
        assert_eq!(
            asset_path(dir, "video.mp4").unwrap(),
            PathBuf::from("/tmp/assets/video.mp4")
        );
    }

    #[test]
    fn asset_path_rejects_escapes() {
        let dir = Path::new("/tmp/assets");
        for name in ["../etc/passwd", "/etc/passwd", "a/../../b", ""] {
            assert!(
                matches!(asset_path(dir, name), Err(ClientError::InvalidAssetName(_))),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn assets_dir_is_created_with_prefix() {
        let dir = create_assets_dir().unwrap();
        assert!(dir.is_dir());
        let name = dir.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(ASSETS_DIR_PREFIX));
        std::fs::remove_dir_all(dir).unwrap();
    }
}
