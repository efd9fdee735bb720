//! Preview/download workflow: saving a previewed image into the media library.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use sundora_api_client::SessionBackend;
use sundora_core::{PreviewState, ShareError, ShareResult};

/// Device media library (photo gallery).
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Ask for write access. `Ok(false)` means the user refused.
    async fn request_write_permission(&self) -> ShareResult<bool>;

    /// Persist a downloaded file into the library and return where it landed.
    async fn save(&self, staged: &Path) -> ShareResult<PathBuf>;
}

/// Media library backed by a plain directory.
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    root: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl MediaLibrary for DirectoryLibrary {
    async fn request_write_permission(&self) -> ShareResult<bool> {
        if let Err(err) = tokio::fs::create_dir_all(&self.root).await {
            tracing::debug!(root = %self.root.display(), error = %err, "Media directory unavailable");
            return Ok(false);
        }
        let meta = tokio::fs::metadata(&self.root).await?;
        Ok(meta.is_dir() && !meta.permissions().readonly())
    }

    async fn save(&self, staged: &Path) -> ShareResult<PathBuf> {
        let file_name = staged
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image");
        let dest = unused_path(&self.root, file_name).await;
        tokio::fs::copy(staged, &dest).await?;
        Ok(dest)
    }
}

/// `root/name`, or `root/stem (n).ext` if that already exists.
async fn unused_path(root: &Path, file_name: &str) -> PathBuf {
    let candidate = root.join(file_name);
    if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
        return candidate;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };
    let mut n = 1;
    loop {
        let name = match ext {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = root.join(name);
        if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return candidate;
        }
        n += 1;
    }
}

/// Local file name for a download: the last path segment of the original name.
pub(crate) fn staged_file_name(file_name: &str) -> String {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .unwrap_or("image")
        .to_string()
}

/// Download the previewed image into `staging_dir` and save it to `library`.
///
/// The library is only asked for permission once the bytes are local. The staged
/// copy is removed afterwards whether or not the save went through.
pub async fn save_preview(
    backend: &dyn SessionBackend,
    library: &dyn MediaLibrary,
    preview: &PreviewState,
    staging_dir: &Path,
) -> ShareResult<PathBuf> {
    tokio::fs::create_dir_all(staging_dir).await?;
    let staged = staging_dir.join(staged_file_name(&preview.file_name));

    backend.download_file(&preview.url, &staged).await?;

    if !library.request_write_permission().await? {
        remove_staged(&staged).await;
        return Err(ShareError::PermissionDenied);
    }

    let saved = library.save(&staged).await;
    remove_staged(&staged).await;
    let saved = saved?;
    tracing::info!(url = %preview.url, saved = %saved.display(), "Image saved to media library");
    Ok(saved)
}

async fn remove_staged(staged: &Path) {
    if let Err(err) = tokio::fs::remove_file(staged).await {
        tracing::warn!(path = %staged.display(), error = %err, "Failed to remove staged download");
    }
}
