use serde::{Deserialize, Serialize};

use super::SessionCode;

/// One uploaded object as reported by the session listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Server-relative or absolute resource path; may be missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type", default)]
    pub file_type: String,
}

impl FileItem {
    pub fn is_image(&self) -> bool {
        self.file_type.starts_with("image")
    }

    /// Resource path for this item, reconstructed from its id when the listing
    /// carried no url.
    pub fn resource_path(&self, code: &SessionCode) -> String {
        match self.url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => url.to_string(),
            None => format!("/api/session/{}/file/{}", code, self.id),
        }
    }

    /// Absolute URL for fetching the item's bytes.
    pub fn resolve_url(&self, base_url: &str, code: &SessionCode) -> String {
        let path = self.resource_path(code);
        if path.starts_with("http://") || path.starts_with("https://") {
            return path;
        }

        let base = base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

/// `GET /api/session/{code}` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionListing {
    #[serde(default)]
    pub files: Option<Vec<FileItem>>,
}

impl SessionListing {
    /// Files in server order; an absent or null array is an empty session.
    pub fn into_files(self) -> Vec<FileItem> {
        self.files.unwrap_or_default()
    }
}

/// `POST /api/session` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionResponse {
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> SessionCode {
        SessionCode::parse("4444").unwrap()
    }

    #[test]
    fn listing_without_files_is_empty() {
        let listing: SessionListing = serde_json::from_str("{}").unwrap();
        assert!(listing.into_files().is_empty());

        let listing: SessionListing = serde_json::from_str(r#"{"files":null}"#).unwrap();
        assert!(listing.into_files().is_empty());
    }

    #[test]
    fn listing_keeps_server_order() {
        let listing: SessionListing = serde_json::from_str(
            r#"{"files":[
                {"id":"1","name":"a.png","url":"/a","type":"image/png"},
                {"id":"2","name":"b.pdf","type":"application/pdf"}
            ]}"#,
        )
        .unwrap();
        let files = listing.into_files();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].id, "1");
        assert_eq!(files[1].url, None);
        assert_eq!(files[1].file_type, "application/pdf");
    }

    #[test]
    fn image_detection_uses_type_prefix() {
        let mut item = FileItem {
            id: "1".into(),
            name: "x".into(),
            url: None,
            file_type: "image/png".into(),
        };
        assert!(item.is_image());
        item.file_type = "application/pdf".into();
        assert!(!item.is_image());
        item.file_type = String::new();
        assert!(!item.is_image());
    }

    #[test]
    fn missing_url_is_reconstructed() {
        let item = FileItem {
            id: "abc".into(),
            name: "x.png".into(),
            url: Some(String::new()),
            file_type: "image/png".into(),
        };
        assert_eq!(item.resource_path(&code()), "/api/session/4444/file/abc");
        assert_eq!(
            item.resolve_url("http://host/", &code()),
            "http://host/api/session/4444/file/abc"
        );
    }

    #[test]
    fn absolute_urls_are_kept() {
        let item = FileItem {
            id: "abc".into(),
            name: "x.png".into(),
            url: Some("https://cdn.example.com/x.png".into()),
            file_type: "image/png".into(),
        };
        assert_eq!(
            item.resolve_url("http://host", &code()),
            "https://cdn.example.com/x.png"
        );
    }

    #[test]
    fn relative_urls_without_slash_are_joined() {
        let item = FileItem {
            id: "abc".into(),
            name: "x.png".into(),
            url: Some("uploads/x.png".into()),
            file_type: "image/png".into(),
        };
        assert_eq!(item.resolve_url("http://host", &code()), "http://host/uploads/x.png");
    }
}
