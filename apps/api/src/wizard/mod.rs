//! Wizard controller — owns the live record, the current step, and the
//! session lifecycle.
//!
//! All mutations funnel through [`RecordStore::mutate`]: one lock, one
//! serialization point, one write-through persistence path. The persistence
//! queue is a single consumer task, so saved blobs land on disk in the order
//! the triggering mutations happened. Saves are best-effort: failures are
//! logged and the in-memory record stays authoritative.

pub mod handlers;

use std::sync::{Arc, Mutex};

use base64::Engine;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::record::{
    CvRecord, Education, Experience, ExperienceCategory, Project, RecordPatch,
};
use crate::steps::{last_step, STEPS};
use crate::storage::FileStore;

/// Largest accepted photo upload, in raw image bytes.
pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Home,
    Builder,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSnapshot {
    pub view: View,
    pub step_index: usize,
    pub step_name: &'static str,
    pub step_count: usize,
    pub resumable: bool,
    pub revision: u64,
}

struct Inner {
    view: View,
    step_index: usize,
    record: CvRecord,
    resumable: bool,
}

enum PersistCmd {
    Save(String),
    Clear,
    #[cfg(test)]
    Flush(tokio::sync::oneshot::Sender<()>),
}

/// The single owned state container behind every handler.
pub struct RecordStore {
    inner: Mutex<Inner>,
    persist_tx: mpsc::UnboundedSender<PersistCmd>,
    changes: watch::Sender<u64>,
}

impl RecordStore {
    /// Builds the store and spawns its persistence writer task.
    /// A restored record leaves the session on the home view with the
    /// resumable flag set; the caller chooses continue or start-new.
    pub fn new(restored: Option<CvRecord>, file_store: FileStore) -> Arc<Self> {
        let resumable = restored.as_ref().is_some_and(CvRecord::is_resumable);
        let record = restored.unwrap_or_default();
        if resumable {
            info!("Prior session found; offering continue/start-new");
        }

        let (persist_tx, persist_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_persistence(file_store, persist_rx));

        let (changes, _) = watch::channel(0);
        Arc::new(RecordStore {
            inner: Mutex::new(Inner {
                view: View::Home,
                step_index: 0,
                record,
                resumable,
            }),
            persist_tx,
            changes,
        })
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        let inner = self.lock();
        WizardSnapshot {
            view: inner.view,
            step_index: inner.step_index,
            step_name: STEPS[inner.step_index].name,
            step_count: STEPS.len(),
            resumable: inner.resumable,
            revision: *self.changes.borrow(),
        }
    }

    pub fn record(&self) -> CvRecord {
        self.lock().record.clone()
    }

    /// Subscribes to record revisions; receivers wake on every mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    // ── navigation ──────────────────────────────────────────────────────────

    /// Advances one step, saturating at Review. Never rejects for
    /// incomplete fields — every step is optional.
    pub fn go_next(&self) -> WizardSnapshot {
        {
            let mut inner = self.lock();
            inner.step_index = (inner.step_index + 1).min(last_step());
        }
        self.snapshot()
    }

    /// Goes back one step, saturating at the first step.
    pub fn go_prev(&self) -> WizardSnapshot {
        {
            let mut inner = self.lock();
            inner.step_index = inner.step_index.saturating_sub(1);
        }
        self.snapshot()
    }

    /// Resumes the restored session in the builder.
    pub fn continue_session(&self) -> WizardSnapshot {
        self.lock().view = View::Builder;
        self.snapshot()
    }

    pub fn go_home(&self) -> WizardSnapshot {
        self.lock().view = View::Home;
        self.snapshot()
    }

    // ── lifecycle ───────────────────────────────────────────────────────────

    /// Starts a fresh CV, destroying current progress and the saved copy.
    /// Requires confirmation whenever the current record holds anything.
    pub fn start_new(&self, confirm: bool) -> Result<WizardSnapshot, AppError> {
        self.destroy_session(confirm, Some(View::Builder))
    }

    /// Same destruction as [`start_new`], but stays on the current view.
    ///
    /// [`start_new`]: RecordStore::start_new
    pub fn reset(&self, confirm: bool) -> Result<WizardSnapshot, AppError> {
        self.destroy_session(confirm, None)
    }

    fn destroy_session(
        &self,
        confirm: bool,
        next_view: Option<View>,
    ) -> Result<WizardSnapshot, AppError> {
        {
            let mut inner = self.lock();
            if inner.record != CvRecord::default() && !confirm {
                return Err(AppError::ConfirmationRequired(
                    "This will delete your current progress".to_string(),
                ));
            }
            inner.record = CvRecord::default();
            inner.step_index = 0;
            inner.resumable = false;
            if let Some(view) = next_view {
                inner.view = view;
            }
        }
        self.enqueue(PersistCmd::Clear);
        self.changes.send_modify(|rev| *rev += 1);
        Ok(self.snapshot())
    }

    // ── mutation ────────────────────────────────────────────────────────────

    /// The single mutation path. Runs `f` against the record under the lock,
    /// then (while in the builder) enqueues a write-through save of the
    /// state as of this mutation and bumps the change revision.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut CvRecord) -> R) -> R {
        let (result, blob) = {
            let mut inner = self.lock();
            let result = f(&mut inner.record);
            let blob = if inner.view == View::Builder {
                match serde_json::to_string(&inner.record) {
                    Ok(blob) => Some(blob),
                    Err(e) => {
                        warn!("Skipping session save, record failed to serialize: {e}");
                        None
                    }
                }
            } else {
                None
            };
            (result, blob)
        };
        if let Some(blob) = blob {
            self.enqueue(PersistCmd::Save(blob));
        }
        self.changes.send_modify(|rev| *rev += 1);
        result
    }

    /// Shallow-merges a partial update and returns the resulting record.
    pub fn apply_patch(&self, patch: RecordPatch) -> CvRecord {
        self.mutate(|record| {
            record.apply(patch);
            record.clone()
        })
    }

    // ── identifier-keyed entries ────────────────────────────────────────────

    pub fn add_education(&self, mut entry: Education) -> Education {
        entry.id = Uuid::new_v4();
        self.mutate(|record| record.education.push(entry.clone()));
        entry
    }

    pub fn remove_education(&self, id: Uuid) -> Result<(), AppError> {
        let removed = self.mutate(|record| {
            let before = record.education.len();
            record.education.retain(|e| e.id != id);
            record.education.len() < before
        });
        if removed {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("education entry {id}")))
        }
    }

    pub fn add_experience(
        &self,
        category: ExperienceCategory,
        mut entry: Experience,
    ) -> Experience {
        entry.id = Uuid::new_v4();
        entry.category = category;
        self.mutate(|record| {
            let list = match category {
                ExperienceCategory::Work => &mut record.work_experience,
                ExperienceCategory::Volunteer => &mut record.volunteer_experience,
            };
            list.push(entry.clone());
        });
        entry
    }

    pub fn remove_experience(&self, category: ExperienceCategory, id: Uuid) -> Result<(), AppError> {
        let removed = self.mutate(|record| {
            let list = match category {
                ExperienceCategory::Work => &mut record.work_experience,
                ExperienceCategory::Volunteer => &mut record.volunteer_experience,
            };
            let before = list.len();
            list.retain(|e| e.id != id);
            list.len() < before
        });
        if removed {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("experience entry {id}")))
        }
    }

    pub fn add_project(&self, mut entry: Project) -> Project {
        entry.id = Uuid::new_v4();
        self.mutate(|record| record.projects.push(entry.clone()));
        entry
    }

    pub fn remove_project(&self, id: Uuid) -> Result<(), AppError> {
        let removed = self.mutate(|record| {
            let before = record.projects.len();
            record.projects.retain(|p| p.id != id);
            record.projects.len() < before
        });
        if removed {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("project entry {id}")))
        }
    }

    // ── photo ───────────────────────────────────────────────────────────────

    /// Validates and stores an uploaded photo as a base64 data URL.
    /// Oversized or non-image uploads are rejected with no state change.
    pub fn set_photo(&self, bytes: &[u8]) -> Result<(), AppError> {
        let data_url = encode_photo(bytes)?;
        self.mutate(|record| record.personal_info.photo = Some(data_url));
        Ok(())
    }

    pub fn clear_photo(&self) {
        self.mutate(|record| record.personal_info.photo = None);
    }

    // ── internals ───────────────────────────────────────────────────────────

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Mutations never panic while holding the lock; recover anyway.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enqueue(&self, cmd: PersistCmd) {
        if self.persist_tx.send(cmd).is_err() {
            warn!("Persistence task is gone; session changes stay in memory only");
        }
    }

    /// Waits until every previously enqueued save has been written.
    #[cfg(test)]
    pub(crate) async fn flush(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        if self.persist_tx.send(PersistCmd::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

/// Encodes raw image bytes as a `data:` URL, enforcing the size cap.
pub fn encode_photo(bytes: &[u8]) -> Result<String, AppError> {
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(AppError::PhotoTooLarge(bytes.len(), MAX_PHOTO_BYTES));
    }
    let kind = infer::get(bytes)
        .filter(|k| k.matcher_type() == infer::MatcherType::Image)
        .ok_or_else(|| AppError::Validation("Uploaded file is not an image".to_string()))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{encoded}", kind.mime_type()))
}

async fn run_persistence(store: FileStore, mut rx: mpsc::UnboundedReceiver<PersistCmd>) {
    while let Some(cmd) = rx.recv().await {
        let result = match cmd {
            PersistCmd::Save(blob) => store.save(&blob).await,
            PersistCmd::Clear => store.clear().await,
            #[cfg(test)]
            PersistCmd::Flush(done) => {
                let _ = done.send(());
                Ok(())
            }
        };
        if let Err(e) = result {
            // Persistence is a convenience; the in-memory record remains
            // authoritative for the current session.
            warn!("Session write failed (continuing in memory): {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn jpeg_bytes(len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        bytes[..4].copy_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);
        bytes
    }

    fn test_store(dir: &TempDir) -> (Arc<RecordStore>, FileStore) {
        let file_store = FileStore::new(dir.path());
        (RecordStore::new(None, file_store.clone()), file_store)
    }

    #[tokio::test]
    async fn test_navigation_saturates_at_both_ends() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = test_store(&dir);

        assert_eq!(store.go_prev().step_index, 0, "prev at step 0 is a no-op");

        for _ in 0..STEPS.len() + 3 {
            store.go_next();
        }
        assert_eq!(store.snapshot().step_index, last_step());
        assert_eq!(store.go_next().step_index, last_step());
    }

    #[tokio::test]
    async fn test_next_then_prev_returns_to_interior_step() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = test_store(&dir);
        store.go_next();
        store.go_next();
        let before = store.snapshot().step_index;
        store.go_next();
        assert_eq!(store.go_prev().step_index, before);
    }

    #[tokio::test]
    async fn test_apply_patch_write_through_in_builder_view() {
        let dir = tempfile::tempdir().unwrap();
        let (store, file_store) = test_store(&dir);
        store.continue_session();

        store.apply_patch(RecordPatch {
            objective: Some("I am a student at HCT.".to_string()),
            ..Default::default()
        });
        store.flush().await;

        let saved = file_store.load().await.expect("session should be saved");
        assert_eq!(saved.objective, "I am a student at HCT.");
    }

    #[tokio::test]
    async fn test_no_persistence_on_home_view() {
        let dir = tempfile::tempdir().unwrap();
        let (store, file_store) = test_store(&dir);

        store.apply_patch(RecordPatch {
            objective: Some("draft".to_string()),
            ..Default::default()
        });
        store.flush().await;

        assert!(file_store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_saves_land_in_mutation_order() {
        let dir = tempfile::tempdir().unwrap();
        let (store, file_store) = test_store(&dir);
        store.continue_session();

        for i in 0..10 {
            store.apply_patch(RecordPatch {
                objective: Some(format!("revision {i}")),
                ..Default::default()
            });
        }
        store.flush().await;

        let saved = file_store.load().await.unwrap();
        assert_eq!(saved.objective, "revision 9");
    }

    #[tokio::test]
    async fn test_start_new_requires_confirmation_when_record_nonempty() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = test_store(&dir);
        store.continue_session();
        store.apply_patch(RecordPatch {
            objective: Some("keep me".to_string()),
            ..Default::default()
        });

        let err = store.start_new(false).expect_err("must require confirmation");
        assert!(matches!(err, AppError::ConfirmationRequired(_)));
        assert_eq!(store.record().objective, "keep me");
    }

    #[tokio::test]
    async fn test_start_new_with_confirmation_erases_everything() {
        let dir = tempfile::tempdir().unwrap();
        let (store, file_store) = test_store(&dir);
        store.continue_session();
        store.go_next();
        store.apply_patch(RecordPatch {
            objective: Some("gone".to_string()),
            ..Default::default()
        });
        store.flush().await;

        let snapshot = store.start_new(true).unwrap();
        store.flush().await;

        assert_eq!(snapshot.step_index, 0);
        assert_eq!(snapshot.view, View::Builder);
        assert_eq!(store.record(), CvRecord::default());
        assert!(file_store.load().await.is_none(), "saved copy must be erased");
    }

    #[tokio::test]
    async fn test_reset_keeps_current_view() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = test_store(&dir);
        store.continue_session();
        store.reset(true).unwrap();
        assert_eq!(store.snapshot().view, View::Builder);
    }

    #[tokio::test]
    async fn test_entry_ids_are_unique_and_removal_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = test_store(&dir);

        let a = store.add_education(Education::default());
        let b = store.add_education(Education::default());
        let c = store.add_education(Education::default());
        assert_ne!(a.id, b.id);
        assert_ne!(b.id, c.id);

        store.remove_education(b.id).unwrap();
        let record = store.record();
        let ids: Vec<Uuid> = record.education.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);

        let err = store.remove_education(b.id).expect_err("id is gone");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_experience_categories_are_separate_sequences() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = test_store(&dir);

        let work = store.add_experience(ExperienceCategory::Work, Experience::empty(ExperienceCategory::Work));
        store.add_experience(
            ExperienceCategory::Volunteer,
            Experience::empty(ExperienceCategory::Volunteer),
        );

        store.remove_experience(ExperienceCategory::Work, work.id).unwrap();
        let record = store.record();
        assert!(record.work_experience.is_empty());
        assert_eq!(record.volunteer_experience.len(), 1);
    }

    #[tokio::test]
    async fn test_photo_at_exact_limit_accepted_one_byte_over_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = test_store(&dir);

        store.set_photo(&jpeg_bytes(MAX_PHOTO_BYTES)).unwrap();
        let photo = store.record().personal_info.photo.expect("photo stored");
        assert!(photo.starts_with("data:image/jpeg;base64,"));

        let err = store
            .set_photo(&jpeg_bytes(MAX_PHOTO_BYTES + 1))
            .expect_err("one byte over must be rejected");
        assert!(matches!(err, AppError::PhotoTooLarge(_, _)));
        // prior photo untouched
        assert!(store.record().personal_info.photo.is_some());
    }

    #[tokio::test]
    async fn test_non_image_upload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = test_store(&dir);
        let err = store.set_photo(b"plain text file").expect_err("not an image");
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.record().personal_info.photo.is_none());
    }

    #[tokio::test]
    async fn test_restored_record_marks_session_resumable() {
        let dir = tempfile::tempdir().unwrap();
        let file_store = FileStore::new(dir.path());
        let mut record = CvRecord::default();
        record.personal_info.first_name = "Ahmed".to_string();

        let store = RecordStore::new(Some(record), file_store);
        let snapshot = store.snapshot();
        assert!(snapshot.resumable);
        assert_eq!(snapshot.view, View::Home);
    }

    #[tokio::test]
    async fn test_subscription_sees_revision_bumps() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = test_store(&dir);
        let mut rx = store.subscribe();
        let before = *rx.borrow_and_update();

        store.apply_patch(RecordPatch::default());
        rx.changed().await.unwrap();
        assert!(*rx.borrow() > before);
    }
}
