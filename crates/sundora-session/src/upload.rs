//! Upload workflow: picking an asset and turning it into an [`UploadRequest`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use sundora_core::mime::{mime_for_file_name, resolve_mime_type};
use sundora_core::models::generate_client_id;
use sundora_core::{AssetKind, ShareError, ShareResult, UploadRequest};

/// A local file chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedAsset {
    pub path: PathBuf,
    /// Display name reported by the picker, if any.
    pub name: Option<String>,
    /// MIME type reported by the picker, if any.
    pub mime_type: Option<String>,
}

/// Source of local assets (the platform image or document picker).
#[async_trait]
pub trait AssetPicker: Send + Sync {
    /// `Ok(None)` means the user cancelled.
    async fn pick(&self, kind: AssetKind) -> ShareResult<Option<PickedAsset>>;
}

/// Picker that always returns one fixed path, as given on a command line.
#[derive(Debug, Clone)]
pub struct PathPicker {
    path: PathBuf,
}

impl PathPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AssetPicker for PathPicker {
    async fn pick(&self, kind: AssetKind) -> ShareResult<Option<PickedAsset>> {
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);

        // Image pickers report a type; document pickers often do not.
        let mime_type = match (kind, name.as_deref()) {
            (AssetKind::Image, Some(name)) => Some(mime_for_file_name(name))
                .filter(|mime| mime.starts_with("image/"))
                .map(str::to_string),
            _ => None,
        };

        Ok(Some(PickedAsset {
            path: self.path.clone(),
            name,
            mime_type,
        }))
    }
}

/// Validate a picked asset and describe the upload.
///
/// Fails with [`ShareError::EmptyFile`] before any network use when the file is
/// empty or cannot be inspected.
pub async fn prepare_upload(asset: PickedAsset, kind: AssetKind) -> ShareResult<UploadRequest> {
    let file_name = resolve_file_name(&asset, kind);

    let mut file_size = resolve_size(&asset.path).await;
    if file_size == 0 && kind == AssetKind::Document {
        // Freshly copied documents can report zero once; ask again.
        file_size = resolve_size(&asset.path).await;
    }
    if file_size == 0 {
        return Err(ShareError::EmptyFile(file_name));
    }

    let file_type = resolve_mime_type(kind, asset.mime_type.as_deref(), &file_name);

    Ok(UploadRequest {
        file_name,
        file_type,
        file_size,
        client_id: generate_client_id(),
        source: asset.path,
    })
}

/// Size of a local file; 0 when it is missing or not a regular file.
pub async fn resolve_size(path: &Path) -> u64 {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => 0,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "Cannot stat picked file");
            0
        }
    }
}

fn resolve_file_name(asset: &PickedAsset, kind: AssetKind) -> String {
    asset
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .or_else(|| asset.path.file_name().and_then(|n| n.to_str()))
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| kind.fallback_file_name(chrono::Utc::now().timestamp_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(path: PathBuf) -> PickedAsset {
        PickedAsset {
            path,
            name: None,
            mime_type: None,
        }
    }

    #[tokio::test]
    async fn zero_byte_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        std::fs::write(&path, b"").unwrap();

        let err = prepare_upload(asset(path), AssetKind::Document)
            .await
            .unwrap_err();
        assert!(matches!(err, ShareError::EmptyFile(ref name) if name == "empty.pdf"));
    }

    #[tokio::test]
    async fn missing_file_is_rejected_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let err = prepare_upload(asset(dir.path().join("nope.jpg")), AssetKind::Image)
            .await
            .unwrap_err();
        assert!(matches!(err, ShareError::EmptyFile(_)));
    }

    #[tokio::test]
    async fn document_type_comes_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("report.pdf");
        let odd = dir.path().join("blob.xyz");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();
        std::fs::write(&odd, b"??").unwrap();

        let request = prepare_upload(asset(pdf.clone()), AssetKind::Document)
            .await
            .unwrap();
        assert_eq!(request.file_name, "report.pdf");
        assert_eq!(request.file_type, "application/pdf");
        assert_eq!(request.file_size, 8);
        assert_eq!(request.source, pdf);
        assert_eq!(request.client_id.len(), 8);

        let request = prepare_upload(asset(odd), AssetKind::Document).await.unwrap();
        assert_eq!(request.file_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn picker_name_and_type_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tmp-123");
        std::fs::write(&path, [0u8; 16]).unwrap();

        let picked = PickedAsset {
            path,
            name: Some("holiday.heic".to_string()),
            mime_type: Some("image/heic".to_string()),
        };
        let request = prepare_upload(picked, AssetKind::Image).await.unwrap();
        assert_eq!(request.file_name, "holiday.heic");
        assert_eq!(request.file_type, "image/heic");
    }

    #[tokio::test]
    async fn image_without_reported_type_is_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        std::fs::write(&path, [1u8; 4]).unwrap();

        let request = prepare_upload(asset(path), AssetKind::Image).await.unwrap();
        assert_eq!(request.file_type, "image/jpeg");
    }

    #[tokio::test]
    async fn path_picker_reports_image_types_only_for_images() {
        let picker = PathPicker::new("/photos/cat.png");
        let picked = picker.pick(AssetKind::Image).await.unwrap().unwrap();
        assert_eq!(picked.name.as_deref(), Some("cat.png"));
        assert_eq!(picked.mime_type.as_deref(), Some("image/png"));

        let picked = picker.pick(AssetKind::Document).await.unwrap().unwrap();
        assert_eq!(picked.mime_type, None);

        let picked = PathPicker::new("/docs/a.pdf")
            .pick(AssetKind::Image)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(picked.mime_type, None);
    }

    #[test]
    fn fallback_file_names() {
        let picked = asset(PathBuf::from("/"));
        let name = resolve_file_name(&picked, AssetKind::Image);
        assert!(name.starts_with("image_") && name.ends_with(".jpg"));

        let name = resolve_file_name(&picked, AssetKind::Document);
        assert!(name.starts_with("document_"));
    }
}
