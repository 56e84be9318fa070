use std::collections::BTreeMap;

use mediadrop_protocol::FileStatus;
use mediadrop_transfer::RawFile;
use serde::Serialize;
use tracing::warn;

use crate::{FileId, TrackedFile, UploadedArtifact, format_file_size};

/// Snapshot of the upload registry.
///
/// Read-only outside this crate; every mutation goes through
/// [`UploadStore`](crate::UploadStore). The mutators below return whether
/// anything changed so the store can skip notifying subscribers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadState {
    files: Vec<TrackedFile>,
    upload_queue: Vec<FileId>,
    errors: BTreeMap<FileId, String>,
    total_progress: f64,
    is_uploading: bool,
    show_upload_progress: bool,
    show_success_message: bool,
    last_uploaded: Option<FileId>,
    artifacts: Vec<UploadedArtifact>,
}

/// Aggregate counts over the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadStats {
    pub total: usize,
    pub pending: usize,
    pub uploading: usize,
    pub completed: usize,
    pub errors: usize,
    pub total_bytes: u64,
    pub uploaded_bytes: u64,
    pub total_size: String,
    pub uploaded_size: String,
    /// Share of completed files, rounded, 0 when empty.
    pub completion_percent: u8,
    pub has_errors: bool,
    pub is_complete: bool,
    pub is_empty: bool,
}

impl UploadState {
    // -- Accessors ---------------------------------------------------------

    /// Tracked files in insertion order.
    pub fn files(&self) -> &[TrackedFile] {
        &self.files
    }

    pub fn upload_queue(&self) -> &[FileId] {
        &self.upload_queue
    }

    pub fn errors(&self) -> &BTreeMap<FileId, String> {
        &self.errors
    }

    /// Mean progress across all files; 0 for an empty registry.
    pub fn total_progress(&self) -> f64 {
        self.total_progress
    }

    pub fn is_uploading(&self) -> bool {
        self.is_uploading
    }

    pub fn show_upload_progress(&self) -> bool {
        self.show_upload_progress
    }

    pub fn show_success_message(&self) -> bool {
        self.show_success_message
    }

    pub fn last_uploaded(&self) -> Option<&FileId> {
        self.last_uploaded.as_ref()
    }

    pub fn artifacts(&self) -> &[UploadedArtifact] {
        &self.artifacts
    }

    // -- Derived views -----------------------------------------------------

    pub fn file(&self, id: &FileId) -> Option<&TrackedFile> {
        self.files.iter().find(|f| f.id() == id)
    }

    pub fn contains(&self, id: &FileId) -> bool {
        self.file(id).is_some()
    }

    pub fn files_with_status(&self, status: FileStatus) -> impl Iterator<Item = &TrackedFile> {
        self.files.iter().filter(move |f| f.status == status)
    }

    /// Ids of pending files in insertion order.
    pub fn pending_ids(&self) -> Vec<FileId> {
        self.files_with_status(FileStatus::Pending)
            .map(|f| f.id().clone())
            .collect()
    }

    /// Whether any file is currently uploading.
    pub fn has_uploading(&self) -> bool {
        self.files.iter().any(|f| f.status == FileStatus::Uploading)
    }

    pub fn error_for(&self, id: &FileId) -> Option<&str> {
        self.errors.get(id).map(String::as_str)
    }

    pub fn is_queued(&self, id: &FileId) -> bool {
        self.upload_queue.contains(id)
    }

    pub fn artifact_for(&self, id: &FileId) -> Option<&UploadedArtifact> {
        self.artifacts.iter().find(|a| &a.source_file_id == id)
    }

    pub fn stats(&self) -> UploadStats {
        let count = |status| self.files_with_status(status).count();
        let total = self.files.len();
        let completed = count(FileStatus::Completed);
        let errors = count(FileStatus::Error);
        let total_bytes: u64 = self.files.iter().map(TrackedFile::byte_size).sum();
        let uploaded_bytes: u64 = self
            .files_with_status(FileStatus::Completed)
            .map(TrackedFile::byte_size)
            .sum();

        let completion_percent = if total == 0 {
            0
        } else {
            (completed as f64 / total as f64 * 100.0).round() as u8
        };

        UploadStats {
            total,
            pending: count(FileStatus::Pending),
            uploading: count(FileStatus::Uploading),
            completed,
            errors,
            total_bytes,
            uploaded_bytes,
            total_size: format_file_size(total_bytes),
            uploaded_size: format_file_size(uploaded_bytes),
            completion_percent,
            has_errors: errors > 0,
            is_complete: total > 0 && completed == total,
            is_empty: total == 0,
        }
    }

    // -- Mutations ---------------------------------------------------------

    pub(crate) fn add_files(&mut self, raw_files: Vec<RawFile>) -> Vec<FileId> {
        let ids = raw_files
            .into_iter()
            .map(|raw| {
                let file = TrackedFile::new(raw);
                let id = file.id().clone();
                self.files.push(file);
                id
            })
            .collect();
        self.recompute_progress();
        ids
    }

    pub(crate) fn remove_file(&mut self, id: &FileId) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.id() != id);
        if self.files.len() == before {
            return false;
        }
        self.upload_queue.retain(|q| q != id);
        self.errors.remove(id);
        self.recompute_progress();
        true
    }

    pub(crate) fn clear_all_files(&mut self) -> bool {
        let changed = !self.files.is_empty()
            || !self.upload_queue.is_empty()
            || !self.errors.is_empty()
            || self.total_progress != 0.0;
        self.files.clear();
        self.upload_queue.clear();
        self.errors.clear();
        self.total_progress = 0.0;
        changed
    }

    pub(crate) fn clear_completed_files(&mut self) -> bool {
        let removed: Vec<FileId> = self
            .files_with_status(FileStatus::Completed)
            .map(|f| f.id().clone())
            .collect();
        if removed.is_empty() {
            return false;
        }
        for id in &removed {
            self.remove_file(id);
        }
        true
    }

    pub(crate) fn update_progress(&mut self, id: &FileId, percent: u8) -> bool {
        let percent = if percent > 100 {
            warn!(file = %id, percent, "progress above 100, clamping");
            100
        } else {
            percent
        };
        let Some(file) = self.file_mut(id) else {
            return false;
        };
        if file.progress == percent {
            return false;
        }
        file.progress = percent;
        self.recompute_progress();
        true
    }

    pub(crate) fn set_status(
        &mut self,
        id: &FileId,
        status: FileStatus,
        error: Option<String>,
    ) -> bool {
        let Some(file) = self.file_mut(id) else {
            return false;
        };
        let changed = file.status != status || file.error_message != error;
        file.status = status;
        file.error_message = error.clone();
        let errors_changed = match error {
            Some(message) => self.errors.insert(id.clone(), message.clone()) != Some(message),
            None => self.errors.remove(id).is_some(),
        };
        self.recompute_progress();
        changed || errors_changed
    }

    pub(crate) fn set_uploaded_reference(&mut self, id: &FileId, reference: String) -> bool {
        let Some(file) = self.file_mut(id) else {
            return false;
        };
        file.uploaded_reference = Some(reference);
        file.status = FileStatus::Completed;
        file.progress = 100;
        file.error_message = None;
        self.errors.remove(id);
        self.recompute_progress();
        true
    }

    pub(crate) fn add_to_queue(&mut self, id: &FileId) -> bool {
        if !self.contains(id) || self.is_queued(id) {
            return false;
        }
        self.upload_queue.push(id.clone());
        true
    }

    pub(crate) fn remove_from_queue(&mut self, id: &FileId) -> bool {
        let before = self.upload_queue.len();
        self.upload_queue.retain(|q| q != id);
        self.upload_queue.len() != before
    }

    pub(crate) fn clear_queue(&mut self) -> bool {
        let changed = !self.upload_queue.is_empty();
        self.upload_queue.clear();
        changed
    }

    pub(crate) fn set_error(&mut self, id: &FileId, message: String) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.errors.insert(id.clone(), message.clone()) != Some(message)
    }

    pub(crate) fn clear_error(&mut self, id: &FileId) -> bool {
        self.errors.remove(id).is_some()
    }

    pub(crate) fn clear_all_errors(&mut self) -> bool {
        let changed = !self.errors.is_empty();
        self.errors.clear();
        changed
    }

    pub(crate) fn set_is_uploading(&mut self, value: bool) -> bool {
        replace_flag(&mut self.is_uploading, value)
    }

    pub(crate) fn set_show_upload_progress(&mut self, value: bool) -> bool {
        replace_flag(&mut self.show_upload_progress, value)
    }

    pub(crate) fn set_show_success_message(&mut self, value: bool) -> bool {
        replace_flag(&mut self.show_success_message, value)
    }

    pub(crate) fn set_last_uploaded(&mut self, id: Option<FileId>) -> bool {
        if self.last_uploaded == id {
            return false;
        }
        self.last_uploaded = id;
        true
    }

    pub(crate) fn add_artifacts(&mut self, artifacts: Vec<UploadedArtifact>) -> bool {
        if artifacts.is_empty() {
            return false;
        }
        self.artifacts.extend(artifacts);
        true
    }

    pub(crate) fn clear_artifacts(&mut self) -> bool {
        let changed = !self.artifacts.is_empty();
        self.artifacts.clear();
        changed
    }

    fn file_mut(&mut self, id: &FileId) -> Option<&mut TrackedFile> {
        self.files.iter_mut().find(|f| f.id() == id)
    }

    fn recompute_progress(&mut self) {
        self.total_progress = if self.files.is_empty() {
            0.0
        } else {
            let sum: f64 = self.files.iter().map(|f| f64::from(f.progress)).sum();
            sum / self.files.len() as f64
        };
    }
}

fn replace_flag(flag: &mut bool, value: bool) -> bool {
    std::mem::replace(flag, value) != value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, size: usize) -> RawFile {
        RawFile::from_bytes(name, "image/png", vec![0u8; size])
    }

    fn state_with(n: usize) -> (UploadState, Vec<FileId>) {
        let mut state = UploadState::default();
        let ids = state.add_files((0..n).map(|i| raw(&format!("{i}.png"), 10)).collect());
        (state, ids)
    }

    #[test]
    fn add_files_preserves_order_without_dedup() {
        let mut state = UploadState::default();
        let ids = state.add_files(vec![raw("a.png", 1), raw("a.png", 1), raw("b.png", 1)]);
        assert_eq!(ids.len(), 3);
        let names: Vec<&str> = state.files().iter().map(TrackedFile::name).collect();
        assert_eq!(names, ["a.png", "a.png", "b.png"]);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(state.total_progress(), 0.0);
    }

    #[test]
    fn remove_file_cleans_queue_and_errors() {
        let (mut state, ids) = state_with(3);
        state.add_to_queue(&ids[1]);
        state.set_status(&ids[1], FileStatus::Error, Some("boom".into()));

        assert!(state.remove_file(&ids[1]));
        assert_eq!(state.files().len(), 2);
        assert!(!state.is_queued(&ids[1]));
        assert!(state.error_for(&ids[1]).is_none());
        assert!(state.errors().is_empty());
    }

    #[test]
    fn add_then_remove_sequence_leaves_no_orphans() {
        let (mut state, ids) = state_with(5);
        for id in &ids {
            state.add_to_queue(id);
            state.set_error(id, "e".into());
        }
        let mut removed = 0;
        for id in ids.iter().step_by(2) {
            if state.remove_file(id) {
                removed += 1;
            }
        }
        // Removing twice is a no-op.
        assert!(!state.remove_file(&ids[0]));

        assert_eq!(state.files().len(), 5 - removed);
        for q in state.upload_queue() {
            assert!(state.contains(q));
        }
        for key in state.errors().keys() {
            assert!(state.contains(key));
        }
    }

    #[test]
    fn remove_unknown_id_changes_nothing() {
        let (mut state, ids) = state_with(2);
        state.update_progress(&ids[0], 50);
        let before = state.total_progress();

        assert!(!state.remove_file(&FileId::from("missing")));
        assert_eq!(state.files().len(), 2);
        assert_eq!(state.total_progress(), before);
    }

    #[test]
    fn total_progress_is_mean() {
        let (mut state, ids) = state_with(4);
        state.update_progress(&ids[0], 100);
        state.update_progress(&ids[1], 50);
        assert_eq!(state.total_progress(), 37.5);

        state.remove_file(&ids[0]);
        assert_eq!(state.total_progress(), 50.0 / 3.0);

        state.clear_all_files();
        assert_eq!(state.total_progress(), 0.0);
    }

    #[test]
    fn update_progress_clamps_above_100() {
        let (mut state, ids) = state_with(1);
        assert!(state.update_progress(&ids[0], 150));
        assert_eq!(state.file(&ids[0]).unwrap().progress(), 100);
        assert!(!state.update_progress(&ids[0], 100));
    }

    #[test]
    fn status_error_then_completed_clears_error() {
        let (mut state, ids) = state_with(1);
        state.set_status(&ids[0], FileStatus::Error, Some("bad".into()));
        assert_eq!(state.error_for(&ids[0]), Some("bad"));
        assert_eq!(state.file(&ids[0]).unwrap().error_message(), Some("bad"));

        state.set_status(&ids[0], FileStatus::Completed, None);
        assert!(state.error_for(&ids[0]).is_none());
        assert!(state.file(&ids[0]).unwrap().error_message().is_none());
        // Raw setter does not touch progress.
        assert_eq!(state.file(&ids[0]).unwrap().progress(), 0);
    }

    #[test]
    fn set_status_on_unknown_id_does_not_record_error() {
        let (mut state, _) = state_with(1);
        let ghost = FileId::from("ghost");
        assert!(!state.set_status(&ghost, FileStatus::Error, Some("x".into())));
        assert!(state.errors().is_empty());
        assert!(!state.set_error(&ghost, "x".into()));
    }

    #[test]
    fn uploaded_reference_forces_completion() {
        let (mut state, ids) = state_with(2);
        state.set_status(&ids[0], FileStatus::Error, Some("bad".into()));
        state.set_uploaded_reference(&ids[0], "https://cdn/a".into());

        let file = state.file(&ids[0]).unwrap();
        assert_eq!(file.status(), FileStatus::Completed);
        assert_eq!(file.progress(), 100);
        assert_eq!(file.uploaded_reference(), Some("https://cdn/a"));
        assert!(state.error_for(&ids[0]).is_none());
        assert_eq!(state.total_progress(), 50.0);
    }

    #[test]
    fn clear_all_is_idempotent() {
        let (mut state, ids) = state_with(2);
        state.add_to_queue(&ids[0]);
        state.set_error(&ids[1], "e".into());

        assert!(state.clear_all_files());
        assert!(!state.clear_all_files());
        assert!(state.files().is_empty());
        assert!(state.upload_queue().is_empty());
        assert!(state.errors().is_empty());
        assert_eq!(state.total_progress(), 0.0);
    }

    #[test]
    fn clear_completed_keeps_others() {
        let (mut state, ids) = state_with(3);
        state.set_uploaded_reference(&ids[0], "r".into());
        state.set_status(&ids[1], FileStatus::Error, Some("e".into()));

        assert!(state.clear_completed_files());
        assert_eq!(state.files().len(), 2);
        assert!(!state.contains(&ids[0]));
        assert_eq!(state.total_progress(), 0.0);
        assert!(!state.clear_completed_files());
    }

    #[test]
    fn queue_is_ordered_and_duplicate_free() {
        let (mut state, ids) = state_with(3);
        assert!(state.add_to_queue(&ids[2]));
        assert!(state.add_to_queue(&ids[0]));
        assert!(!state.add_to_queue(&ids[2]));
        assert!(!state.add_to_queue(&FileId::from("missing")));
        assert_eq!(state.upload_queue(), [ids[2].clone(), ids[0].clone()]);

        assert!(state.remove_from_queue(&ids[2]));
        assert!(!state.remove_from_queue(&ids[2]));
        assert!(state.clear_queue());
        assert!(state.upload_queue().is_empty());
    }

    #[test]
    fn errors_map_is_independent_of_status() {
        let (mut state, ids) = state_with(2);
        assert!(state.set_error(&ids[0], "a".into()));
        assert!(!state.set_error(&ids[0], "a".into()));
        assert_eq!(state.file(&ids[0]).unwrap().status(), FileStatus::Pending);
        assert!(state.set_error(&ids[1], "b".into()));

        assert!(state.clear_error(&ids[0]));
        assert!(!state.clear_error(&ids[0]));
        assert!(state.clear_all_errors());
        assert!(state.errors().is_empty());
    }

    #[test]
    fn flags_report_changes() {
        let mut state = UploadState::default();
        assert!(state.set_is_uploading(true));
        assert!(!state.set_is_uploading(true));
        assert!(state.set_show_upload_progress(true));
        assert!(state.set_show_success_message(true));
        assert!(state.set_last_uploaded(Some("a".into())));
        assert!(!state.set_last_uploaded(Some("a".into())));
    }

    #[test]
    fn stats_summarize_registry() {
        let mut state = UploadState::default();
        let ids = state.add_files(vec![raw("a", 1024), raw("b", 1024), raw("c", 512), raw("d", 0)]);
        state.set_uploaded_reference(&ids[0], "r".into());
        state.set_status(&ids[1], FileStatus::Uploading, None);
        state.set_status(&ids[2], FileStatus::Error, Some("e".into()));

        let stats = state.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(
            (stats.pending, stats.uploading, stats.completed, stats.errors),
            (1, 1, 1, 1)
        );
        assert_eq!(stats.total_bytes, 2560);
        assert_eq!(stats.total_size, "2.5 KB");
        assert_eq!(stats.uploaded_size, "1 KB");
        assert_eq!(stats.completion_percent, 25);
        assert!(stats.has_errors);
        assert!(!stats.is_complete);
        assert!(!stats.is_empty);
        assert!(state.has_uploading());
        assert_eq!(state.pending_ids(), vec![ids[3].clone()]);
    }

    #[test]
    fn stats_of_empty_registry() {
        let stats = UploadState::default().stats();
        assert!(stats.is_empty);
        assert!(!stats.is_complete);
        assert_eq!(stats.completion_percent, 0);
        assert_eq!(stats.total_size, "0 Bytes");
    }
}
