use serde::Serialize;

use super::{FileItem, SessionCode};

/// Image currently shown full-screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewState {
    pub url: String,
    /// Original file name, reused when the image is saved.
    pub file_name: String,
}

impl PreviewState {
    /// Preview for `item`, or `None` when the item is not an image.
    pub fn for_item(item: &FileItem, base_url: &str, code: &SessionCode) -> Option<Self> {
        item.is_image().then(|| Self {
            url: item.resolve_url(base_url, code),
            file_name: item.name.clone(),
        })
    }
}
