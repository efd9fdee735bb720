//! Domain models for sessions, listed files, uploads and previews.

pub mod file_item;
pub mod preview;
pub mod session_code;
pub mod upload;

pub use file_item::{CreateSessionResponse, FileItem, SessionListing};
pub use preview::PreviewState;
pub use session_code::SessionCode;
pub use upload::{generate_client_id, AssetKind, ProgressFn, UploadEnvelope, UploadRequest};
