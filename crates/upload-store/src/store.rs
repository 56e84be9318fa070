use std::sync::Arc;

use mediadrop_protocol::FileStatus;
use mediadrop_transfer::RawFile;
use tokio::sync::watch;
use tracing::debug;

use crate::{FileId, UploadState, UploadedArtifact};

/// Shared handle to the upload registry.
///
/// Cloning is cheap; all clones see the same state. Each mutation runs
/// atomically and wakes subscribers only if the state changed.
#[derive(Clone)]
pub struct UploadStore {
    tx: Arc<watch::Sender<UploadState>>,
}

impl Default for UploadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadStore {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(UploadState::default())),
        }
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> UploadState {
        self.tx.borrow().clone()
    }

    /// Runs `f` against the current state without cloning it.
    ///
    /// Do not call back into the store from `f`.
    pub fn read<R>(&self, f: impl FnOnce(&UploadState) -> R) -> R {
        f(&*self.tx.borrow())
    }

    /// Receiver notified after every effective mutation.
    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.tx.subscribe()
    }

    /// Subscribes to a projection of the state.
    pub fn select<T, F>(&self, select: F) -> Selector<T>
    where
        T: PartialEq + Clone,
        F: Fn(&UploadState) -> T + Send + Sync + 'static,
    {
        let rx = self.tx.subscribe();
        let last = select(&*rx.borrow());
        Selector {
            rx,
            select: Box::new(select),
            last,
        }
    }

    fn apply(&self, f: impl FnOnce(&mut UploadState) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    // -- Files -------------------------------------------------------------

    /// Registers files as pending, returning their new ids in input order.
    pub fn add_files(&self, files: Vec<RawFile>) -> Vec<FileId> {
        let mut ids = Vec::new();
        self.tx.send_if_modified(|state| {
            ids = state.add_files(files);
            !ids.is_empty()
        });
        debug!(count = ids.len(), "files added");
        ids
    }

    /// Removes a file along with its queue and error entries. Unknown ids
    /// are ignored.
    pub fn remove_file(&self, id: &FileId) -> bool {
        self.apply(|s| s.remove_file(id))
    }

    pub fn clear_all_files(&self) -> bool {
        self.apply(UploadState::clear_all_files)
    }

    pub fn clear_completed_files(&self) -> bool {
        self.apply(UploadState::clear_completed_files)
    }

    /// Sets a file's progress. Values above 100 are clamped.
    pub fn update_progress(&self, id: &FileId, percent: u8) -> bool {
        self.apply(|s| s.update_progress(id, percent))
    }

    /// Sets a file's status. `Some(error)` records it in the error map,
    /// `None` clears any existing entry. Progress is left untouched.
    pub fn set_status(&self, id: &FileId, status: FileStatus, error: Option<String>) -> bool {
        self.apply(|s| s.set_status(id, status, error))
    }

    /// Records the server reference and marks the file completed at 100%.
    pub fn set_uploaded_reference(&self, id: &FileId, reference: impl Into<String>) -> bool {
        let reference = reference.into();
        self.apply(|s| s.set_uploaded_reference(id, reference))
    }

    // -- Queue -------------------------------------------------------------

    /// Appends a registered file to the queue once.
    pub fn add_to_queue(&self, id: &FileId) -> bool {
        self.apply(|s| s.add_to_queue(id))
    }

    pub fn remove_from_queue(&self, id: &FileId) -> bool {
        self.apply(|s| s.remove_from_queue(id))
    }

    pub fn clear_queue(&self) -> bool {
        self.apply(UploadState::clear_queue)
    }

    // -- Errors ------------------------------------------------------------

    pub fn set_error(&self, id: &FileId, message: impl Into<String>) -> bool {
        let message = message.into();
        self.apply(|s| s.set_error(id, message))
    }

    pub fn clear_error(&self, id: &FileId) -> bool {
        self.apply(|s| s.clear_error(id))
    }

    pub fn clear_all_errors(&self) -> bool {
        self.apply(UploadState::clear_all_errors)
    }

    // -- Flags -------------------------------------------------------------

    pub fn set_is_uploading(&self, value: bool) -> bool {
        self.apply(|s| s.set_is_uploading(value))
    }

    /// Re-derives `is_uploading` from whether any file is still uploading.
    pub fn refresh_is_uploading(&self) -> bool {
        self.apply(|s| {
            let uploading = s.has_uploading();
            s.set_is_uploading(uploading)
        })
    }

    pub fn set_show_upload_progress(&self, value: bool) -> bool {
        self.apply(|s| s.set_show_upload_progress(value))
    }

    pub fn set_show_success_message(&self, value: bool) -> bool {
        self.apply(|s| s.set_show_success_message(value))
    }

    pub fn set_last_uploaded(&self, id: Option<FileId>) -> bool {
        self.apply(|s| s.set_last_uploaded(id))
    }

    // -- Artifacts ---------------------------------------------------------

    pub fn add_artifacts(&self, artifacts: Vec<UploadedArtifact>) -> bool {
        self.apply(|s| s.add_artifacts(artifacts))
    }

    pub fn clear_artifacts(&self) -> bool {
        self.apply(UploadState::clear_artifacts)
    }

    /// Returns the store to its initial, empty state.
    pub fn reset(&self) {
        self.tx.send_if_modified(|state| {
            let fresh = UploadState::default();
            let changed = !state.files().is_empty()
                || !state.artifacts().is_empty()
                || state.is_uploading()
                || state.show_upload_progress()
                || state.show_success_message()
                || state.last_uploaded().is_some()
                || !state.errors().is_empty()
                || !state.upload_queue().is_empty();
            *state = fresh;
            changed
        });
    }
}

/// Subscription to a projection of the store.
///
/// [`changed`](Self::changed) resolves only when the projected value differs
/// from the last one observed.
pub struct Selector<T> {
    rx: watch::Receiver<UploadState>,
    select: Box<dyn Fn(&UploadState) -> T + Send + Sync>,
    last: T,
}

impl<T: PartialEq + Clone> Selector<T> {
    /// The last observed value.
    pub fn get(&self) -> &T {
        &self.last
    }

    /// Waits for the projected value to change.
    ///
    /// Returns `None` once every store handle has been dropped.
    pub async fn changed(&mut self) -> Option<T> {
        loop {
            self.rx.changed().await.ok()?;
            let next = (self.select)(&*self.rx.borrow_and_update());
            if next != self.last {
                self.last = next.clone();
                return Some(next);
            }
        }
    }
}
