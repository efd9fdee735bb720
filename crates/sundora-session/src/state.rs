//! Session view state and the reducer that owns every mutation of it.
//!
//! Poll results, upload lifecycle events and preview changes all arrive as
//! [`Command`]s on one queue and are applied here one at a time, so a slow listing
//! response can never interleave with an upload completion.

use serde::Serialize;
use std::path::PathBuf;
use sundora_core::{Alert, FileItem, PreviewState, SessionCode, ShareResult};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPhase {
    /// No listing has succeeded yet.
    Loading,
    /// A listing is displayed; refreshed on every successful poll.
    Ready,
}

/// What an observer of the session sees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub code: SessionCode,
    pub phase: SyncPhase,
    /// Newest first.
    pub files: Vec<FileItem>,
    pub uploading: bool,
    pub upload_progress: f32,
    /// An upload returned and its file has not shown up in a listing yet.
    pub pending_success: bool,
    pub last_file_count: usize,
    pub preview: Option<PreviewState>,
    pub downloading: bool,
}

/// One-shot messages for the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    UploadSucceeded,
    ImageSaved { path: PathBuf },
    Alert(Alert),
}

#[derive(Debug)]
pub(crate) enum Command {
    Listing(ShareResult<Vec<FileItem>>),
    UploadStarted,
    UploadProgress(f32),
    UploadFinished { succeeded: bool },
    OpenPreview(PreviewState),
    ClosePreview,
    /// Replies with the preview to save, or `None` if nothing is shown or a
    /// download is already running.
    BeginDownload(oneshot::Sender<Option<PreviewState>>),
    EndDownload,
    /// Replies once every earlier command has been applied and published.
    Settled(oneshot::Sender<()>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Effect {
    AnnounceUpload,
}

#[derive(Debug)]
pub(crate) struct SessionState {
    code: SessionCode,
    phase: SyncPhase,
    files: Vec<FileItem>,
    last_file_count: usize,
    active_uploads: usize,
    upload_progress: f32,
    /// File count when the oldest in-flight upload started.
    upload_baseline: Option<usize>,
    /// Set once an upload returned; the success notice fires when a listing
    /// holds more files than this.
    pending_baseline: Option<usize>,
    preview: Option<PreviewState>,
    downloading: bool,
}

impl SessionState {
    pub(crate) fn new(code: SessionCode) -> Self {
        Self {
            code,
            phase: SyncPhase::Loading,
            files: Vec::new(),
            last_file_count: 0,
            active_uploads: 0,
            upload_progress: 0.0,
            upload_baseline: None,
            pending_baseline: None,
            preview: None,
            downloading: false,
        }
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            code: self.code.clone(),
            phase: self.phase,
            files: self.files.clone(),
            uploading: self.active_uploads > 0,
            upload_progress: self.upload_progress,
            pending_success: self.pending_baseline.is_some(),
            last_file_count: self.last_file_count,
            preview: self.preview.clone(),
            downloading: self.downloading,
        }
    }

    pub(crate) fn apply(&mut self, command: Command) -> Option<Effect> {
        match command {
            Command::Listing(result) => return self.apply_listing(result),
            Command::UploadStarted => {
                self.active_uploads += 1;
                self.upload_progress = 0.0;
                self.upload_baseline.get_or_insert(self.last_file_count);
            }
            Command::UploadProgress(fraction) => {
                if self.active_uploads > 0 {
                    self.upload_progress = fraction.clamp(0.0, 1.0);
                }
            }
            Command::UploadFinished { succeeded } => {
                self.active_uploads = self.active_uploads.saturating_sub(1);
                self.upload_progress = 0.0;
                if succeeded {
                    let baseline = self.upload_baseline.unwrap_or(self.last_file_count);
                    self.pending_baseline = Some(match self.pending_baseline {
                        Some(existing) => existing.min(baseline),
                        None => baseline,
                    });
                }
                if self.active_uploads == 0 {
                    self.upload_baseline = None;
                }
            }
            Command::OpenPreview(preview) => self.preview = Some(preview),
            Command::ClosePreview => self.preview = None,
            Command::BeginDownload(reply) => {
                let granted = match (&self.preview, self.downloading) {
                    (Some(preview), false) => {
                        self.downloading = true;
                        Some(preview.clone())
                    }
                    _ => None,
                };
                let granted_download = granted.is_some();
                if reply.send(granted).is_err() && granted_download {
                    self.downloading = false;
                }
            }
            Command::EndDownload => self.downloading = false,
            Command::Settled(reply) => {
                let _ = reply.send(());
            }
        }
        None
    }

    fn apply_listing(&mut self, result: ShareResult<Vec<FileItem>>) -> Option<Effect> {
        let mut files = match result {
            Ok(files) => files,
            Err(err) => {
                // Stale-on-error: keep showing the last good listing; the next tick retries.
                tracing::debug!(code = %self.code, error = %err, "Listing failed, keeping previous files");
                return None;
            }
        };

        let count = files.len();
        files.reverse();
        self.files = files;

        if self.phase == SyncPhase::Loading {
            // Baselines taken before any listing saw a count of 0, not the real one.
            if let Some(baseline) = self.upload_baseline.as_mut() {
                *baseline = count;
            }
            if let Some(baseline) = self.pending_baseline.as_mut() {
                *baseline = count;
            }
            self.phase = SyncPhase::Ready;
        }

        let announce = matches!(self.pending_baseline, Some(baseline) if count > baseline);
        if announce {
            self.pending_baseline = None;
        }
        self.last_file_count = count;

        announce.then_some(Effect::AnnounceUpload)
    }
}
