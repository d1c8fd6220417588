//! Asset Fetcher Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    assets::AssetFetcher,
    error::{BridgeError, Result},
};
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Tokio-based asset fetcher reading from a local asset directory
///
/// Logical asset paths are resolved relative to the asset root. A leading
/// `/` is ignored so that web-style paths (`/sounds/cow.wav`) work unchanged.
/// Paths that would escape the root are rejected.
pub struct TokioAssetFetcher {
    root: PathBuf,
}

impl TokioAssetFetcher {
    /// Create a fetcher rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a fetcher rooted at the platform data directory
    /// (`<data_dir>/soundboard/assets`)
    pub fn with_default_root() -> Self {
        let root = dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join("soundboard")
            .join("assets");

        Self { root }
    }

    /// Asset root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a logical asset path to a file under the root
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let mut resolved = self.root.clone();

        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(BridgeError::NotFound(format!(
                        "asset path escapes asset root: {}",
                        path
                    )))
                }
            }
        }

        Ok(resolved)
    }

    fn map_io_error(path: &str, e: std::io::Error) -> BridgeError {
        if e.kind() == std::io::ErrorKind::NotFound {
            BridgeError::NotFound(path.to_string())
        } else {
            BridgeError::Io(e)
        }
    }
}

#[async_trait]
impl AssetFetcher for TokioAssetFetcher {
    async fn fetch(&self, path: &str) -> Result<Bytes> {
        let file = self.resolve(path)?;
        debug!(path = %path, file = ?file, "Reading asset");

        let data = fs::read(&file)
            .await
            .map_err(|e| Self::map_io_error(path, e))?;

        Ok(Bytes::from(data))
    }
}
