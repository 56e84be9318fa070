use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;
use mediadrop_protocol::{FileStatus, UploadResponse};
use mediadrop_transfer::{ProgressCallback, RawFile, validate_file};
use mediadrop_transport::{TransferOutcome, Transport};
use mediadrop_upload_store::{FileId, UploadState, UploadStore, UploadedArtifact};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{PipelineConfig, PipelineError, UploadError, UploadEvent, UploadResult};

/// Token of an in-flight upload, tagged with the attempt that owns it.
struct InFlightEntry {
    attempt: u64,
    token: CancellationToken,
}

type TokenMap = HashMap<FileId, InFlightEntry>;
type InFlight = Arc<Mutex<TokenMap>>;

fn lock(map: &Mutex<TokenMap>) -> MutexGuard<'_, TokenMap> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes the in-flight entry when an upload ends, however it ends.
///
/// An entry that a cancel already removed, or that a newer attempt replaced,
/// is left alone.
struct InFlightGuard {
    map: InFlight,
    id: FileId,
    attempt: u64,
    token: CancellationToken,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut map = lock(&self.map);
        if map.get(&self.id).is_some_and(|e| e.attempt == self.attempt) {
            map.remove(&self.id);
        }
    }
}

/// Orchestrates uploads of files tracked in an [`UploadStore`].
///
/// Each in-flight upload owns a [`CancellationToken`]. Store updates for an
/// upload (progress, completion, failure) and [`cancel`](Self::cancel) are
/// serialized through the in-flight table, so a cancelled upload never
/// writes to the store again.
pub struct UploadPipeline {
    store: UploadStore,
    transport: Arc<dyn Transport>,
    config: PipelineConfig,
    in_flight: InFlight,
    attempts: AtomicU64,
    events: broadcast::Sender<UploadEvent>,
}

impl UploadPipeline {
    /// Creates a pipeline, rejecting malformed validation settings.
    pub fn new(
        store: UploadStore,
        transport: Arc<dyn Transport>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        config
            .validation
            .check()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        let (events, _) = broadcast::channel(256);
        Ok(Self {
            store,
            transport,
            config,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            attempts: AtomicU64::new(0),
            events,
        })
    }

    pub fn store(&self) -> &UploadStore {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Receives lifecycle events published after this call.
    pub fn subscribe_events(&self) -> broadcast::Receiver<UploadEvent> {
        self.events.subscribe()
    }

    /// Whether `id` has an upload in flight.
    pub fn is_in_flight(&self, id: &FileId) -> bool {
        lock(&self.in_flight).contains_key(id)
    }

    /// Uploads one tracked file.
    pub async fn upload_one(&self, id: &FileId) -> UploadResult {
        UploadResult::from_result(id, self.try_upload(id).await)
    }

    /// Uploads files one after another, pausing between them.
    ///
    /// No pause follows the last file or an id that is not registered.
    pub async fn upload_many(&self, ids: &[FileId]) -> Vec<UploadResult> {
        if ids.is_empty() {
            return Vec::new();
        }
        self.store.set_is_uploading(true);
        self.store.set_show_upload_progress(true);

        let mut results = Vec::with_capacity(ids.len());
        for (index, id) in ids.iter().enumerate() {
            let result = self.try_upload(id).await;
            let found = !matches!(result, Err(UploadError::NotFound(_)));
            results.push(UploadResult::from_result(id, result));

            if found && index + 1 < ids.len() && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        self.finish_batch();
        results
    }

    /// Uploads every file currently pending, sequentially.
    pub async fn upload_all_pending(&self) -> Vec<UploadResult> {
        let ids = self.store.read(UploadState::pending_ids);
        self.upload_many(&ids).await
    }

    /// Resets a file to pending with progress 0 and uploads it again.
    pub async fn retry(&self, id: &FileId) -> UploadResult {
        if !self.store.read(|s| s.contains(id)) {
            return UploadResult::from_result(id, Err(UploadError::NotFound(id.clone())));
        }
        if self.is_in_flight(id) {
            return UploadResult::from_result(id, Err(UploadError::AlreadyUploading(id.clone())));
        }

        self.store.set_status(id, FileStatus::Pending, None);
        self.store.update_progress(id, 0);
        self.store.clear_error(id);
        self.emit(UploadEvent::Reset {
            file_id: id.clone(),
        });
        debug!(file = %id, "retrying upload");

        self.upload_one(id).await
    }

    /// Uploads `ids` in consecutive chunks of `concurrency` files.
    ///
    /// Files within a chunk upload concurrently; a chunk starts only after
    /// the previous one fully resolved. Results follow input order.
    pub async fn batch_upload(
        &self,
        ids: &[FileId],
        concurrency: NonZeroUsize,
    ) -> Vec<UploadResult> {
        if ids.is_empty() {
            return Vec::new();
        }
        self.store.set_is_uploading(true);
        self.store.set_show_upload_progress(true);

        let mut results = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(concurrency.get()) {
            debug!(files = chunk.len(), "uploading chunk");
            results.extend(join_all(chunk.iter().map(|id| self.upload_one(id))).await);
        }

        self.finish_batch();
        results
    }

    /// Batch-uploads the queued files in queue order, then removes them from
    /// the queue.
    pub async fn upload_queued(&self, concurrency: NonZeroUsize) -> Vec<UploadResult> {
        let ids: Vec<FileId> = self.store.read(|s| s.upload_queue().to_vec());
        let results = self.batch_upload(&ids, concurrency).await;
        for id in &ids {
            self.store.remove_from_queue(id);
        }
        results
    }

    /// Resets a file to pending with progress 0 and drops it from the queue.
    ///
    /// An in-flight transfer for the file is aborted and its result
    /// discarded; the file can be uploaded again right away. Returns `false`
    /// for an unknown id.
    pub fn cancel(&self, id: &FileId) -> bool {
        let mut in_flight = lock(&self.in_flight);
        if !self.store.read(|s| s.contains(id)) {
            return false;
        }
        if let Some(entry) = in_flight.remove(id) {
            entry.token.cancel();
        }
        self.store.set_status(id, FileStatus::Pending, None);
        self.store.update_progress(id, 0);
        self.store.remove_from_queue(id);
        drop(in_flight);

        self.store.refresh_is_uploading();
        self.emit(UploadEvent::Cancelled {
            file_id: id.clone(),
        });
        info!(file = %id, "upload cancelled");
        true
    }

    async fn try_upload(&self, id: &FileId) -> Result<UploadResponse, UploadError> {
        let raw = self
            .store
            .read(|s| s.file(id).map(|f| f.raw_file().clone()))
            .ok_or_else(|| UploadError::NotFound(id.clone()))?;
        let guard = self.begin(id)?;

        if let Err(e) = validate_file(&raw, &self.config.validation) {
            let err = UploadError::from(e);
            self.fail(id, &err);
            return Err(err);
        }

        self.store.update_progress(id, 0);
        self.store.set_status(id, FileStatus::Uploading, None);
        self.store.set_is_uploading(true);
        self.emit(UploadEvent::Started {
            file_id: id.clone(),
        });
        info!(file = %id, name = raw.name(), bytes = raw.byte_size(), transport = self.transport.name(), "upload started");

        let result = self.transfer(id, raw, &guard.token).await;
        drop(guard);
        self.store.refresh_is_uploading();
        result
    }

    fn begin(&self, id: &FileId) -> Result<InFlightGuard, UploadError> {
        let mut map = lock(&self.in_flight);
        if map.contains_key(id) {
            return Err(UploadError::AlreadyUploading(id.clone()));
        }
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        map.insert(
            id.clone(),
            InFlightEntry {
                attempt,
                token: token.clone(),
            },
        );
        Ok(InFlightGuard {
            map: Arc::clone(&self.in_flight),
            id: id.clone(),
            attempt,
            token,
        })
    }

    async fn transfer(
        &self,
        id: &FileId,
        raw: RawFile,
        token: &CancellationToken,
    ) -> Result<UploadResponse, UploadError> {
        let on_progress = self.progress_callback(id, token);
        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => None,
            res = self.transport.transfer(raw, on_progress) => Some(res),
        };

        let _serialized = lock(&self.in_flight);
        if token.is_cancelled() {
            debug!(file = %id, "discarding result of cancelled upload");
            return Err(UploadError::Cancelled);
        }
        match outcome {
            Some(Ok(outcome)) => {
                self.complete(id, &outcome);
                Ok(outcome.response)
            }
            Some(Err(e)) => {
                let err = UploadError::from(e);
                self.fail(id, &err);
                Err(err)
            }
            None => Err(UploadError::Cancelled),
        }
    }

    fn progress_callback(&self, id: &FileId, token: &CancellationToken) -> ProgressCallback {
        let store = self.store.clone();
        let events = self.events.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let id = id.clone();
        let token = token.clone();
        Arc::new(move |percent| {
            let _serialized = lock(&in_flight);
            if token.is_cancelled() {
                return;
            }
            if store.update_progress(&id, percent) {
                debug!(file = %id, percent, "upload progress");
                let _ = events.send(UploadEvent::Progress {
                    file_id: id.clone(),
                    percent,
                });
            }
        })
    }

    fn complete(&self, id: &FileId, outcome: &TransferOutcome) {
        self.store.set_status(id, FileStatus::Completed, None);
        self.store.update_progress(id, 100);
        // Without a url or analysis the envelope itself is the reference.
        let reference = match outcome.reference() {
            Some(reference) => reference.to_string(),
            None => serde_json::to_string(&outcome.response).unwrap_or_default(),
        };
        self.store.set_uploaded_reference(id, reference);

        if let Some(meta) = &outcome.metadata
            && let Some(name) = self.store.read(|s| s.file(id).map(|f| f.name().to_string()))
            && let Some(artifact) = UploadedArtifact::from_metadata(
                id.clone(),
                &name,
                meta,
                outcome.display_source.clone(),
            )
        {
            self.store.add_artifacts(vec![artifact]);
            self.store.set_show_success_message(true);
        }

        self.store.set_last_uploaded(Some(id.clone()));
        self.emit(UploadEvent::Completed {
            file_id: id.clone(),
        });
        info!(file = %id, "upload completed");
    }

    fn fail(&self, id: &FileId, err: &UploadError) {
        let message = err.to_string();
        self.store.set_status(id, FileStatus::Error, Some(message.clone()));
        warn!(file = %id, error = %message, "upload failed");
        self.emit(UploadEvent::Failed {
            file_id: id.clone(),
            error: message,
        });
    }

    /// Clears the batch progress flag after a delay, if nothing is uploading
    /// by then.
    fn finish_batch(&self) {
        self.store.refresh_is_uploading();
        let store = self.store.clone();
        let delay = self.config.hide_progress_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !store.read(UploadState::has_uploading) {
                store.set_show_upload_progress(false);
            }
        });
    }

    fn emit(&self, event: UploadEvent) {
        let _ = self.events.send(event);
    }
}
