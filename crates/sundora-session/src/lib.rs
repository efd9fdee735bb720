//! Session workflows for Sundora.
//!
//! - [`lobby`]: creating a session or validating a join code
//! - [`SessionHandle`]: the live file-share view. It polls the listing, runs
//!   uploads, and previews/saves images. All state changes go through a single
//!   actor task, and observers read [`SessionSnapshot`]s and [`Notice`]s.
//! - [`upload`] / [`preview`]: the picker and media-library seams plus the
//!   filesystem implementations the CLI uses

mod actor;
pub mod handle;
pub mod lobby;
pub mod preview;
pub mod state;
pub mod upload;

pub use handle::{DownloadOutcome, NoticeReceiver, SessionConfig, SessionHandle, UploadOutcome};
pub use lobby::{create_session, join_session};
pub use preview::{save_preview, DirectoryLibrary, MediaLibrary};
pub use state::{Notice, SessionSnapshot, SyncPhase};
pub use upload::{prepare_upload, AssetPicker, PathPicker, PickedAsset};
