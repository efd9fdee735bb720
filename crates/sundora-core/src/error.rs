//! Error types module
//!
//! Every failure a user action can hit is represented by [`ShareError`]. None of
//! them is fatal: the action boundary converts the error into an [`Alert`] and the
//! view stays usable, so the user can simply retry.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like a malformed join code
    Debug,
    /// Warning level - for recoverable issues like a failed request
    Warn,
    /// Error level - for unexpected local failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty file detected: {0}")]
    EmptyFile(String),

    #[error("Media library write permission denied")]
    PermissionDenied,

    #[error("Invalid session code: {0:?}")]
    InvalidCode(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type ShareResult<T> = Result<T, ShareError>;

/// The user-facing action during which an error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    CreateSession,
    JoinSession,
    UploadImage,
    UploadDocument,
    SaveImage,
}

/// Generic, detail-free message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Alert {
    pub title: &'static str,
    pub message: String,
}

impl Alert {
    pub fn new(title: &'static str, message: impl Into<String>) -> Self {
        Self {
            title,
            message: message.into(),
        }
    }
}

impl ShareError {
    /// Machine-readable error code (e.g., "NETWORK_ERROR")
    pub fn error_code(&self) -> &'static str {
        match self {
            ShareError::Network(_) | ShareError::Status { .. } => "NETWORK_ERROR",
            ShareError::InvalidResponse(_) => "INVALID_RESPONSE",
            ShareError::EmptyFile(_) => "EMPTY_FILE",
            ShareError::PermissionDenied => "PERMISSION_DENIED",
            ShareError::InvalidCode(_) => "INVALID_CODE",
            ShareError::Download(_) => "DOWNLOAD_ERROR",
            ShareError::Io(_) => "IO_ERROR",
        }
    }

    /// Log level for this error
    pub fn log_level(&self) -> LogLevel {
        match self {
            ShareError::InvalidCode(_) | ShareError::PermissionDenied => LogLevel::Debug,
            ShareError::Io(_) => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }

    /// Convert into the alert shown at the boundary of `action`.
    ///
    /// Code and permission problems get their own wording; everything else
    /// collapses into the action's generic failure message.
    pub fn alert(&self, action: UserAction) -> Alert {
        match self {
            ShareError::InvalidCode(_) => {
                Alert::new("Invalid Code", "Enter a valid 4-digit repeated code.")
            }
            ShareError::PermissionDenied => Alert::new(
                "Permission denied",
                "Cannot save image without permission.",
            ),
            _ => {
                let message = match action {
                    UserAction::CreateSession => "Failed to create session",
                    UserAction::JoinSession => "Failed to join session",
                    UserAction::UploadImage => "Failed to upload image",
                    UserAction::UploadDocument => "Failed to upload document",
                    UserAction::SaveImage => "Failed to download image.",
                };
                Alert::new("Error", message)
            }
        }
    }

    /// Emit a tracing event at this error's log level.
    pub fn log(&self, action: UserAction) {
        match self.log_level() {
            LogLevel::Debug => {
                tracing::debug!(error = %self, code = self.error_code(), ?action, "Action failed")
            }
            LogLevel::Warn => {
                tracing::warn!(error = %self, code = self.error_code(), ?action, "Action failed")
            }
            LogLevel::Error => {
                tracing::error!(error = %self, code = self.error_code(), ?action, "Action failed")
            }
        }
    }
}
