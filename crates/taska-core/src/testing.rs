//! In-memory test doubles shared by the unit tests in this crate.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::Mutex;

use taska_types::backend::{ChatBackendError, ChatReply, ChatRequest, UpstreamFileRef};
use taska_types::error::BlobStoreError;
use taska_types::identity::UserId;
use taska_types::session::AttachmentKind;

use crate::chat::backend::ChatBackend;
use crate::storage::blob_store::{Blob, BlobStore, BlobVersion, WritePrecondition};

/// In-memory [`BlobStore`] with counter versions and an injectable queue
/// of put errors for exercising the retry paths.
#[derive(Clone, Default)]
pub(crate) struct TestBlobStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    blobs: HashMap<String, (Vec<u8>, u64)>,
    version_counter: u64,
    put_failures: VecDeque<BlobStoreError>,
}

impl TestBlobStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue an error to be returned by the next `put`, before any state
    /// change. Multiple calls stack FIFO.
    pub(crate) fn fail_next_put(&self, err: BlobStoreError) {
        self.inner.try_lock().unwrap().put_failures.push_back(err);
    }

    /// Keys currently stored, sorted. Handy for asserting on layout.
    pub(crate) async fn keys(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        let mut keys: Vec<String> = inner.blobs.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl BlobStore for TestBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Blob>, BlobStoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.blobs.get(key).map(|(bytes, version)| Blob {
            bytes: bytes.clone(),
            version: BlobVersion::new(version.to_string()),
        }))
    }

    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        precondition: WritePrecondition,
    ) -> Result<BlobVersion, BlobStoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(err) = inner.put_failures.pop_front() {
            return Err(err);
        }

        let current = inner.blobs.get(key).map(|(_, version)| *version);
        match (&precondition, current) {
            (WritePrecondition::None, _) => {}
            (WritePrecondition::IfAbsent, None) => {}
            (WritePrecondition::IfVersion(expected), Some(version))
                if expected.as_str() == version.to_string() => {}
            _ => {
                return Err(BlobStoreError::PreconditionFailed {
                    key: key.to_string(),
                });
            }
        }

        inner.version_counter += 1;
        let version = inner.version_counter;
        inner.blobs.insert(key.to_string(), (bytes.to_vec(), version));
        Ok(BlobVersion::new(version.to_string()))
    }
}

/// Scripted [`ChatBackend`]: replies are dequeued in order, uploads are
/// recorded and answered with synthetic file references.
#[derive(Clone, Default)]
pub(crate) struct FakeChatBackend {
    inner: Arc<Mutex<BackendInner>>,
}

#[derive(Default)]
struct BackendInner {
    replies: VecDeque<Result<ChatReply, ChatBackendError>>,
    requests: Vec<ChatRequest>,
    uploads: Vec<RecordedUpload>,
    upload_failures: VecDeque<ChatBackendError>,
    upload_counter: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedUpload {
    pub(crate) user_id: UserId,
    pub(crate) filename: String,
    pub(crate) byte_len: usize,
}

impl FakeChatBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enqueue_reply(&self, reply: ChatReply) {
        self.inner.try_lock().unwrap().replies.push_back(Ok(reply));
    }

    pub(crate) fn enqueue_error(&self, err: ChatBackendError) {
        self.inner.try_lock().unwrap().replies.push_back(Err(err));
    }

    pub(crate) fn fail_next_upload(&self, err: ChatBackendError) {
        self.inner
            .try_lock()
            .unwrap()
            .upload_failures
            .push_back(err);
    }

    /// Chat requests received so far, in order.
    pub(crate) async fn requests(&self) -> Vec<ChatRequest> {
        self.inner.lock().await.requests.clone()
    }

    /// File uploads received so far, in order.
    pub(crate) async fn uploads(&self) -> Vec<RecordedUpload> {
        self.inner.lock().await.uploads.clone()
    }
}

impl ChatBackend for FakeChatBackend {
    async fn upload_file(
        &self,
        user_id: &UserId,
        filename: &str,
        bytes: &[u8],
    ) -> Result<UpstreamFileRef, ChatBackendError> {
        let mut inner = self.inner.lock().await;
        if let Some(err) = inner.upload_failures.pop_front() {
            return Err(err);
        }
        inner.uploads.push(RecordedUpload {
            user_id: user_id.clone(),
            filename: filename.to_string(),
            byte_len: bytes.len(),
        });
        inner.upload_counter += 1;
        Ok(UpstreamFileRef {
            file_id: format!("upstream-file-{}", inner.upload_counter),
            name: filename.to_string(),
            kind: AttachmentKind::from_filename(filename),
        })
    }

    async fn send_message(&self, request: ChatRequest) -> Result<ChatReply, ChatBackendError> {
        let mut inner = self.inner.lock().await;
        inner.requests.push(request);
        inner
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(ChatBackendError::Transport("no scripted reply".to_string())))
    }
}
