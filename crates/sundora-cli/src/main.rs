//! Sundora CLI: create or join a session and share files from the terminal.
//!
//! Configuration comes from SUNDORA_API_URL (or API_URL), SUNDORA_POLL_INTERVAL_MS,
//! SUNDORA_DOWNLOAD_DIR and SUNDORA_MEDIA_DIR; `--api-url` overrides the backend.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sundora_api_client::ApiClient;
use sundora_cli::{format_alert, init_tracing, notice_message, print_json};
use sundora_core::{AssetKind, ClientConfig, SessionCode, ShareError, UserAction};
use sundora_session::{
    create_session, join_session, DirectoryLibrary, DownloadOutcome, Notice, NoticeReceiver,
    PathPicker, SessionConfig, SessionHandle, UploadOutcome,
};

const TAGLINE: &str = "Sundora: seamless, real-time file sharing between devices.\n\
                       No sign-up. No hassle. Just share.";

#[derive(Parser)]
#[command(
    name = "sundora",
    about = "Seamless, real-time file sharing between devices",
    long_about = TAGLINE
)]
struct Cli {
    /// Backend base URL (overrides SUNDORA_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new session and print its code
    Create {
        /// Keep watching the new session until interrupted
        #[arg(long)]
        follow: bool,
    },
    /// Join a session and watch its files until interrupted
    Join {
        /// 4-digit session code, e.g. 7777
        code: String,
    },
    /// Print the files in a session, newest first
    List {
        code: String,
    },
    /// Upload an image (or, with --document, any file) into a session
    Upload {
        code: String,
        /// Path to the file to upload
        file: PathBuf,
        #[arg(long)]
        document: bool,
        /// How long to wait for the file to show up in the session
        #[arg(long, default_value = "30")]
        wait_secs: u64,
    },
    /// Save an image from a session into the media directory
    Download {
        code: String,
        /// File id as printed by `list`
        id: String,
    },
    /// Generate a session code locally
    Code,
}

fn alerted(err: ShareError, action: UserAction) -> anyhow::Error {
    let alert = err.alert(action);
    anyhow::Error::new(err).context(format_alert(&alert))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config = config.with_api_url(api_url);
    }

    let client = Arc::new(
        ApiClient::from_config(&config).context("Failed to create API client")?,
    );

    match cli.command {
        Commands::Create { follow } => {
            let code = create_session(client.as_ref())
                .await
                .map_err(|err| alerted(err, UserAction::CreateSession))?;
            println!("Session Created, Code: {}", code);
            if follow {
                watch_session(client, code, &config).await?;
            }
        }
        Commands::Join { code } => {
            let code = join_session(&code).map_err(|err| alerted(err, UserAction::JoinSession))?;
            watch_session(client, code, &config).await?;
        }
        Commands::List { code } => {
            let code = join_session(&code).map_err(|err| alerted(err, UserAction::JoinSession))?;
            let mut files = client
                .list_files(&code)
                .await
                .context("Failed to list session files")?;
            files.reverse();
            let rows: Vec<_> = files
                .iter()
                .map(|item| {
                    serde_json::json!({
                        "id": item.id,
                        "name": item.name,
                        "type": item.file_type,
                        "url": item.resolve_url(client.base_url(), &code),
                        "image": item.is_image(),
                    })
                })
                .collect();
            print_json(&rows)?;
        }
        Commands::Upload {
            code,
            file,
            document,
            wait_secs,
        } => {
            let code = join_session(&code).map_err(|err| alerted(err, UserAction::JoinSession))?;
            let (kind, action) = if document {
                (AssetKind::Document, UserAction::UploadDocument)
            } else {
                (AssetKind::Image, UserAction::UploadImage)
            };

            let (handle, mut notices) =
                SessionHandle::open(client, code, SessionConfig::from(&config));
            // The success check compares against the file count shown before the upload.
            if tokio::time::timeout(Duration::from_secs(wait_secs), handle.wait_ready())
                .await
                .is_err()
            {
                tracing::warn!(wait_secs, "Session listing unavailable, uploading anyway");
            }
            match handle.upload(&PathPicker::new(&file), kind).await {
                UploadOutcome::Cancelled => anyhow::bail!("No file selected"),
                UploadOutcome::Failed(err) => return Err(alerted(err, action)),
                UploadOutcome::Submitted {
                    file_name,
                    client_id,
                } => {
                    print_json(&serde_json::json!({
                        "fileName": file_name,
                        "clientId": client_id,
                    }))?;
                }
            }

            if wait_for_upload(&mut notices, Duration::from_secs(wait_secs)).await {
                eprintln!("{}", notice_message(&Notice::UploadSucceeded));
            } else {
                tracing::warn!(
                    wait_secs,
                    "Upload accepted but not yet visible in the session"
                );
            }
            handle.shutdown();
        }
        Commands::Download { code, id } => {
            let code = join_session(&code).map_err(|err| alerted(err, UserAction::JoinSession))?;
            let files = client
                .list_files(&code)
                .await
                .map_err(|err| alerted(err, UserAction::SaveImage))?;
            let item = files
                .into_iter()
                .find(|item| item.id == id)
                .with_context(|| format!("No file with id {} in session {}", id, code))?;

            let (handle, _notices) =
                SessionHandle::open(client, code, SessionConfig::from(&config));
            if !handle.open_preview(&item).await {
                anyhow::bail!("File {} is not an image", item.name);
            }

            let library = DirectoryLibrary::new(&config.media_dir);
            match handle.download_preview(&library).await {
                DownloadOutcome::Saved(path) => {
                    eprintln!("{}", notice_message(&Notice::ImageSaved { path: path.clone() }));
                    print_json(&serde_json::json!({ "saved": path }))?;
                }
                DownloadOutcome::Skipped => anyhow::bail!("A download is already running"),
                DownloadOutcome::Failed(err) => return Err(alerted(err, UserAction::SaveImage)),
            }
            handle.shutdown();
        }
        Commands::Code => {
            println!("{}", SessionCode::generate());
        }
    }

    Ok(())
}

/// Print each distinct snapshot and every notice until Ctrl-C.
async fn watch_session(
    client: Arc<ApiClient>,
    code: SessionCode,
    config: &ClientConfig,
) -> anyhow::Result<()> {
    let (handle, mut notices) = SessionHandle::open(client, code, SessionConfig::from(config));
    let mut snapshots = handle.watch();
    let mut last = snapshots.borrow_and_update().clone();
    print_json(&last)?;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot != last {
                    print_json(&snapshot)?;
                    last = snapshot;
                }
            }
            Some(notice) = notices.recv() => eprintln!("{}", notice_message(&notice)),
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown();
    Ok(())
}

async fn wait_for_upload(notices: &mut NoticeReceiver, wait: Duration) -> bool {
    let seen = async {
        while let Some(notice) = notices.recv().await {
            if notice == Notice::UploadSucceeded {
                return true;
            }
        }
        false
    };
    tokio::time::timeout(wait, seen).await.unwrap_or(false)
}
