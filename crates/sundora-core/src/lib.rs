//! Sundora Core Library
//!
//! This crate provides the domain models, error types and configuration shared
//! by the API client, the session workflows and the CLI.

pub mod config;
pub mod error;
pub mod mime;
pub mod models;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{Alert, LogLevel, ShareError, ShareResult, UserAction};
pub use models::{
    AssetKind, CreateSessionResponse, FileItem, PreviewState, ProgressFn, SessionCode,
    SessionListing, UploadEnvelope, UploadRequest,
};
