//! MIME type resolution for uploads.

use crate::models::AssetKind;

/// Used for any extension missing from [`EXTENSION_MIME_TYPES`].
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Assumed for images whose picker did not report a type.
pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/jpeg";

const EXTENSION_MIME_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("txt", "text/plain"),
];

/// Look up the MIME type for a file name by its (case-insensitive) extension.
pub fn mime_for_file_name(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or(file_name)
        .to_ascii_lowercase();

    EXTENSION_MIME_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// Pick the MIME type sent with an upload. The picker-reported type always wins.
pub fn resolve_mime_type(kind: AssetKind, reported: Option<&str>, file_name: &str) -> String {
    if let Some(reported) = reported.map(str::trim).filter(|m| !m.is_empty()) {
        return reported.to_string();
    }

    match kind {
        AssetKind::Image => DEFAULT_IMAGE_MIME_TYPE.to_string(),
        AssetKind::Document => mime_for_file_name(file_name).to_string(),
    }
}
