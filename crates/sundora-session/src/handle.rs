//! The file-share view of one session.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sundora_api_client::SessionBackend;
use sundora_core::{
    AssetKind, ClientConfig, FileItem, PreviewState, ProgressFn, SessionCode, ShareError,
    UserAction,
};
use tokio::sync::{mpsc, oneshot, watch};

use crate::actor::{poll_loop, SessionActor};
use crate::preview::{save_preview, MediaLibrary};
use crate::state::{Command, Notice, SessionSnapshot, SessionState, SyncPhase};
use crate::upload::{prepare_upload, AssetPicker};

const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Receives [`Notice`]s for the user, in order.
pub type NoticeReceiver = mpsc::UnboundedReceiver<Notice>;

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub poll_interval: Duration,
    pub success_notice_delay: Duration,
    pub download_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for SessionConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            success_notice_delay: config.success_notice_delay,
            download_dir: config.download_dir.clone(),
        }
    }
}

#[derive(Debug)]
pub enum UploadOutcome {
    /// The picker was dismissed; nothing changed.
    Cancelled,
    /// The backend accepted the file. The success notice follows once a listing
    /// shows it.
    Submitted { file_name: String, client_id: String },
    Failed(ShareError),
}

#[derive(Debug)]
pub enum DownloadOutcome {
    /// No preview open, or a download is already running.
    Skipped,
    Saved(PathBuf),
    Failed(ShareError),
}

/// Handle to a live session view.
///
/// Opening one starts the poll loop and the state actor; dropping it (or calling
/// [`shutdown`](Self::shutdown)) stops both. Results that arrive afterwards are
/// discarded.
pub struct SessionHandle {
    code: SessionCode,
    backend: Arc<dyn SessionBackend>,
    config: SessionConfig,
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    notices: mpsc::UnboundedSender<Notice>,
    shutdown: watch::Sender<bool>,
}

impl SessionHandle {
    pub fn open(
        backend: Arc<dyn SessionBackend>,
        code: SessionCode,
        config: SessionConfig,
    ) -> (Self, NoticeReceiver) {
        let state = SessionState::new(code.clone());
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let actor = SessionActor::new(
            state,
            command_rx,
            snapshot_tx,
            notice_tx.clone(),
            shutdown_rx.clone(),
            config.success_notice_delay,
        );
        tokio::spawn(actor.run());
        tokio::spawn(poll_loop(
            backend.clone(),
            code.clone(),
            config.poll_interval,
            command_tx.clone(),
            shutdown_rx,
        ));

        let handle = Self {
            code,
            backend,
            config,
            commands: command_tx,
            snapshots: snapshot_rx,
            notices: notice_tx,
            shutdown: shutdown_tx,
        };
        (handle, notice_rx)
    }

    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that wakes on every state change.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Resolves once a listing has been shown, or the view has shut down.
    pub async fn wait_ready(&self) {
        let mut snapshots = self.snapshots.clone();
        let _ = snapshots.wait_for(|s| s.phase == SyncPhase::Ready).await;
    }

    /// Pick an asset and upload it into the session.
    pub async fn upload(&self, picker: &dyn AssetPicker, kind: AssetKind) -> UploadOutcome {
        let action = match kind {
            AssetKind::Image => UserAction::UploadImage,
            AssetKind::Document => UserAction::UploadDocument,
        };

        let asset = match picker.pick(kind).await {
            Ok(Some(asset)) => asset,
            Ok(None) => return UploadOutcome::Cancelled,
            Err(err) => return UploadOutcome::Failed(self.fail(err, action)),
        };

        let request = match prepare_upload(asset, kind).await {
            Ok(request) => request,
            Err(err) => return UploadOutcome::Failed(self.fail(err, action)),
        };

        self.send(Command::UploadStarted).await;
        let commands = self.commands.clone();
        let progress: ProgressFn = Arc::new(move |fraction| {
            // Dropping an update under backpressure is fine; a later one supersedes it.
            let _ = commands.try_send(Command::UploadProgress(fraction));
        });
        let result = self
            .backend
            .upload_file(&self.code, &request, progress)
            .await;
        self.send(Command::UploadFinished {
            succeeded: result.is_ok(),
        })
        .await;
        self.settle().await;

        match result {
            Ok(()) => UploadOutcome::Submitted {
                file_name: request.file_name,
                client_id: request.client_id,
            },
            Err(err) => UploadOutcome::Failed(self.fail(err, action)),
        }
    }

    /// Show `item` full-screen. Returns `false` for non-image items.
    pub async fn open_preview(&self, item: &FileItem) -> bool {
        match PreviewState::for_item(item, self.backend.base_url(), &self.code) {
            Some(preview) => {
                self.send(Command::OpenPreview(preview)).await;
                self.settle().await;
                true
            }
            None => false,
        }
    }

    pub async fn close_preview(&self) {
        self.send(Command::ClosePreview).await;
        self.settle().await;
    }

    /// Save the previewed image into `library`.
    pub async fn download_preview(&self, library: &dyn MediaLibrary) -> DownloadOutcome {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::BeginDownload(reply_tx)).await;
        let preview = match reply_rx.await {
            Ok(Some(preview)) => preview,
            _ => return DownloadOutcome::Skipped,
        };

        let result = save_preview(
            self.backend.as_ref(),
            library,
            &preview,
            &self.config.download_dir,
        )
        .await;
        self.send(Command::EndDownload).await;
        self.settle().await;

        match result {
            Ok(path) => {
                let _ = self.notices.send(Notice::ImageSaved { path: path.clone() });
                DownloadOutcome::Saved(path)
            }
            Err(err) => DownloadOutcome::Failed(self.fail(err, UserAction::SaveImage)),
        }
    }

    /// Stop polling and discard anything still in flight.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    async fn send(&self, command: Command) {
        if self.commands.send(command).await.is_err() {
            tracing::debug!(code = %self.code, "Session view closed, dropping command");
        }
    }

    /// Wait until the snapshot reflects every command sent so far.
    async fn settle(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Settled(reply_tx)).await;
        let _ = reply_rx.await;
    }

    fn fail(&self, err: ShareError, action: UserAction) -> ShareError {
        err.log(action);
        let _ = self.notices.send(Notice::Alert(err.alert(action)));
        err
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}
