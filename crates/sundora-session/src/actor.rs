//! Background tasks behind a [`SessionHandle`](crate::SessionHandle): the actor that
//! owns [`SessionState`] and the poll loop that feeds it listings.

use std::sync::Arc;
use std::time::Duration;
use sundora_api_client::SessionBackend;
use sundora_core::SessionCode;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};

use crate::state::{Command, Effect, Notice, SessionSnapshot, SessionState};

pub(crate) struct SessionActor {
    state: SessionState,
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<SessionSnapshot>,
    notices: mpsc::UnboundedSender<Notice>,
    shutdown: watch::Receiver<bool>,
    success_notice_delay: Duration,
}

impl SessionActor {
    pub(crate) fn new(
        state: SessionState,
        commands: mpsc::Receiver<Command>,
        snapshots: watch::Sender<SessionSnapshot>,
        notices: mpsc::UnboundedSender<Notice>,
        shutdown: watch::Receiver<bool>,
        success_notice_delay: Duration,
    ) -> Self {
        Self {
            state,
            commands,
            snapshots,
            notices,
            shutdown,
            success_notice_delay,
        }
    }

    /// Apply commands until the view is torn down.
    pub(crate) async fn run(mut self) {
        loop {
            let command = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
                _ = self.shutdown.changed() => break,
            };

            let effect = self.state.apply(command);
            self.snapshots.send_replace(self.state.snapshot());

            if let Some(Effect::AnnounceUpload) = effect {
                self.schedule_success_notice();
            }
        }

        tracing::debug!(code = %self.state.snapshot().code, "Session actor stopped");
    }

    fn schedule_success_notice(&self) {
        let notices = self.notices.clone();
        let mut shutdown = self.shutdown.clone();
        let delay = self.success_notice_delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    tracing::info!("Upload visible in session");
                    let _ = notices.send(Notice::UploadSucceeded);
                }
                _ = shutdown.changed() => {}
            }
        });
    }
}

/// Fetch the listing on a fixed cadence until shutdown.
///
/// A fetch is awaited before the next tick is taken, and ticks missed meanwhile
/// are skipped, so at most one listing request is ever in flight.
pub(crate) async fn poll_loop(
    backend: Arc<dyn SessionBackend>,
    code: SessionCode,
    period: Duration,
    commands: mpsc::Sender<Command>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(code = %code, period_ms = period.as_millis() as u64, "Session polling started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        let result = tokio::select! {
            result = backend.list_files(&code) => result,
            _ = shutdown.changed() => break,
        };

        match &result {
            Ok(files) => tracing::debug!(code = %code, count = files.len(), "Listing fetched"),
            Err(err) => tracing::debug!(code = %code, error = %err, "Listing fetch failed"),
        }

        if commands.send(Command::Listing(result)).await.is_err() {
            break;
        }
    }

    tracing::info!(code = %code, "Session polling stopped");
}
