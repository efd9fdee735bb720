//! Streamed JSON upload body.
//!
//! The backend expects `{fileName, fileType, fileSize, clientId, fileData}` with the
//! whole file inlined as a base64 `data:` URI. The body is produced in pieces:
//! the JSON head, then the payload encoded chunk by chunk straight from disk, then
//! the closing bytes. Its exact length is known before the first byte is sent.

use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use futures::stream::{self, Stream};
use std::io;
use sundora_core::{ProgressFn, ShareError, ShareResult, UploadRequest};
use tokio::io::{AsyncRead, AsyncReadExt, Take};

/// Raw bytes encoded per chunk. Must stay a multiple of 3 so that the chunk
/// encodings concatenate into one valid base64 string.
const CHUNK_SIZE: usize = 3 * 16 * 1024;

const BODY_SUFFIX: &[u8] = b"\"}";

pub(crate) struct UploadBody<R> {
    head: Bytes,
    reader: Take<R>,
    file_size: u64,
    len: u64,
    progress: ProgressFn,
}

impl<R> UploadBody<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub(crate) fn new(request: &UploadRequest, reader: R, progress: ProgressFn) -> ShareResult<Self> {
        let head = Bytes::from(body_head(request)?);
        let len = head.len() as u64 + request.encoded_payload_len() + BODY_SUFFIX.len() as u64;

        Ok(Self {
            head,
            reader: reader.take(request.file_size),
            file_size: request.file_size,
            len,
            progress,
        })
    }

    /// Exact number of bytes the stream yields.
    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    pub(crate) fn into_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        let state = BodyState {
            stage: Stage::Head,
            head: self.head,
            reader: self.reader,
            buf: vec![0; CHUNK_SIZE],
            file_size: self.file_size,
            payload_read: 0,
            sent: 0,
            len: self.len,
            progress: self.progress,
        };
        stream::try_unfold(state, next_chunk)
    }

    pub(crate) fn into_body(self) -> reqwest::Body {
        reqwest::Body::wrap_stream(self.into_stream())
    }
}

/// Everything up to and including the `data:` URI prefix of `fileData`.
fn body_head(request: &UploadRequest) -> ShareResult<String> {
    let envelope = serde_json::to_string(&request.envelope()).map_err(encode_error)?;
    let data_prefix = serde_json::to_string(&request.data_uri_prefix()).map_err(encode_error)?;

    // `{"fileName":...,"clientId":"..."}` -> `{"fileName":...,"clientId":"...","fileData":"data:...;base64,`
    let object = envelope.strip_suffix('}').unwrap_or(&envelope);
    let open_string = data_prefix.strip_suffix('"').unwrap_or(&data_prefix);
    Ok(format!("{},\"fileData\":{}", object, open_string))
}

fn encode_error(err: serde_json::Error) -> ShareError {
    ShareError::Io(io::Error::new(io::ErrorKind::InvalidData, err))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Head,
    Payload,
    Done,
}

struct BodyState<R> {
    stage: Stage,
    head: Bytes,
    reader: Take<R>,
    buf: Vec<u8>,
    file_size: u64,
    payload_read: u64,
    sent: u64,
    len: u64,
    progress: ProgressFn,
}

async fn next_chunk<R>(mut state: BodyState<R>) -> io::Result<Option<(Bytes, BodyState<R>)>>
where
    R: AsyncRead + Unpin,
{
    let chunk = match state.stage {
        Stage::Head => {
            state.stage = Stage::Payload;
            state.head.clone()
        }
        Stage::Payload => {
            let filled = fill(&mut state.reader, &mut state.buf).await?;
            if filled == 0 {
                if state.payload_read != state.file_size {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!(
                            "file shrank during upload: read {} of {} bytes",
                            state.payload_read, state.file_size
                        ),
                    ));
                }
                state.stage = Stage::Done;
                Bytes::from_static(BODY_SUFFIX)
            } else {
                state.payload_read += filled as u64;
                Bytes::from(general_purpose::STANDARD.encode(&state.buf[..filled]))
            }
        }
        Stage::Done => return Ok(None),
    };

    state.sent += chunk.len() as u64;
    (state.progress)((state.sent as f64 / state.len as f64).min(1.0) as f32);
    Ok(Some((chunk, state)))
}

/// Read until `buf` is full or the reader is exhausted.
async fn fill<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    fn request(name: &str, mime: &str, size: u64) -> UploadRequest {
        UploadRequest {
            file_name: name.to_string(),
            file_type: mime.to_string(),
            file_size: size,
            client_id: "k3y9z0ab".to_string(),
            source: PathBuf::from("unused"),
        }
    }

    fn recorder() -> (ProgressFn, Arc<Mutex<Vec<f32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress: ProgressFn = Arc::new(move |p| sink.lock().unwrap().push(p));
        (progress, seen)
    }

    async fn collect(body: UploadBody<Cursor<Vec<u8>>>) -> io::Result<Vec<u8>> {
        let chunks: Vec<Bytes> = body.into_stream().try_collect().await?;
        Ok(chunks.concat())
    }

    #[tokio::test]
    async fn body_is_valid_json_with_data_uri() {
        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let (progress, seen) = recorder();
        let req = request("photo \"1\".png", "image/png", payload.len() as u64);

        let body = UploadBody::new(&req, Cursor::new(payload.clone()), progress).unwrap();
        let expected_len = body.len();
        let raw = collect(body).await.unwrap();
        assert_eq!(raw.len() as u64, expected_len);

        let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value["fileName"], "photo \"1\".png");
        assert_eq!(value["fileType"], "image/png");
        assert_eq!(value["fileSize"], 100_000);
        assert_eq!(value["clientId"], "k3y9z0ab");

        let data = value["fileData"].as_str().unwrap();
        let encoded = data.strip_prefix("data:image/png;base64,").unwrap();
        assert_eq!(general_purpose::STANDARD.decode(encoded).unwrap(), payload);

        let seen = seen.lock().unwrap();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), 1.0);
    }

    #[tokio::test]
    async fn small_payload_fits_one_chunk() {
        let (progress, _) = recorder();
        let req = request("a.txt", "text/plain", 5);
        let body = UploadBody::new(&req, Cursor::new(b"hello".to_vec()), progress).unwrap();
        let raw = collect(body).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value["fileData"], "data:text/plain;base64,aGVsbG8=");
    }

    #[tokio::test]
    async fn reader_longer_than_declared_size_is_truncated() {
        let (progress, _) = recorder();
        let req = request("a.txt", "text/plain", 3);
        let body = UploadBody::new(&req, Cursor::new(b"abcdef".to_vec()), progress).unwrap();
        let raw = collect(body).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value["fileData"], "data:text/plain;base64,YWJj");
    }

    #[tokio::test]
    async fn shrunken_file_fails_the_stream() {
        let (progress, _) = recorder();
        let req = request("a.txt", "text/plain", 10);
        let body = UploadBody::new(&req, Cursor::new(b"abc".to_vec()), progress).unwrap();
        let err = collect(body).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
