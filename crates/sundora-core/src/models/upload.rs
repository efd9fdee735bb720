use std::path::PathBuf;
use std::sync::Arc;

use rand::Rng;
use serde::Serialize;

/// Receives upload progress as a fraction in `[0, 1]`.
pub type ProgressFn = Arc<dyn Fn(f32) + Send + Sync>;

const CLIENT_ID_LEN: usize = 8;
const CLIENT_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Which picker produced an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Document,
}

impl AssetKind {
    /// File name used when neither the picker nor the path yields one.
    pub fn fallback_file_name(self, epoch_millis: i64) -> String {
        match self {
            AssetKind::Image => format!("image_{}.jpg", epoch_millis),
            AssetKind::Document => format!("document_{}", epoch_millis),
        }
    }
}

/// A single upload attempt. The payload stays on disk at `source` and is
/// base64-encoded while the request body is streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    /// Random per-attempt identifier. The backend receives it, but nothing on this
    /// side deduplicates on it.
    pub client_id: String,
    pub source: PathBuf,
}

impl UploadRequest {
    /// `data:` URI prefix placed in front of the base64 payload.
    pub fn data_uri_prefix(&self) -> String {
        format!("data:{};base64,", self.file_type)
    }

    /// Length of the padded base64 encoding of the payload.
    pub fn encoded_payload_len(&self) -> u64 {
        self.file_size.div_ceil(3) * 4
    }

    /// Every body field except `fileData`.
    pub fn envelope(&self) -> UploadEnvelope<'_> {
        UploadEnvelope {
            file_name: &self.file_name,
            file_type: &self.file_type,
            file_size: self.file_size,
            client_id: &self.client_id,
        }
    }
}

/// Scalar fields of the upload JSON body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadEnvelope<'a> {
    pub file_name: &'a str,
    pub file_type: &'a str,
    pub file_size: u64,
    pub client_id: &'a str,
}

/// Eight random lowercase alphanumeric characters.
pub fn generate_client_id() -> String {
    let mut rng = rand::rng();
    (0..CLIENT_ID_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CLIENT_ID_ALPHABET.len());
            char::from(CLIENT_ID_ALPHABET[idx])
        })
        .collect()
}
