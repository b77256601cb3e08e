//! Profile page controller: owns the displayed profile state and turns edit
//! submissions into writes against the profile and blob stores.
//!
//! Every operation reports its result to the user through the injected
//! [`Notifier`] and never returns an error to the caller. An upload that
//! succeeds followed by a failed document write leaves the uploaded blob
//! without any reference to it; nothing cleans it up.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};
use ts_rs::TS;
use utils::api::profile::{FieldGroup, PersonalInfo, ProfileRecord, ShowCase};

use super::{
    blob_store::{BlobPath, BlobStore, BlobStoreError},
    busy::{BusyGuard, BusySignal},
    notification::{
        CHANGES_SAVED_MESSAGE, GENERAL_ERROR_MESSAGE, Notifier, Severity, USER_NOT_FOUND_MESSAGE,
    },
    profile_store::{ProfileStore, ProfileStoreError},
};

pub const DEFAULT_PICTURE_COLLECTION: &str = "profile_pictures";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum Editor {
    PersonalInfo,
    ShowCase,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct EditorState {
    pub personal_info_open: bool,
    pub show_case_open: bool,
}

impl EditorState {
    pub fn is_open(&self, editor: Editor) -> bool {
        match editor {
            Editor::PersonalInfo => self.personal_info_open,
            Editor::ShowCase => self.show_case_open,
        }
    }

    fn set(&mut self, editor: Editor, open: bool) {
        match editor {
            Editor::PersonalInfo => self.personal_info_open = open,
            Editor::ShowCase => self.show_case_open = open,
        }
    }
}

/// A picture file chosen in the edit form but not uploaded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfilePicture {
    Uploaded(String),
    Pending(PendingFile),
}

/// Personal-info form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalInfoEdit {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub about: String,
    pub profile_picture: ProfilePicture,
}

impl PersonalInfoEdit {
    fn into_personal_info(self, profile_picture: String) -> PersonalInfo {
        PersonalInfo {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            about: self.about,
            profile_picture,
        }
    }
}

impl From<PersonalInfo> for PersonalInfoEdit {
    fn from(info: PersonalInfo) -> Self {
        Self {
            first_name: info.first_name,
            last_name: info.last_name,
            email: info.email,
            about: info.about,
            profile_picture: ProfilePicture::Uploaded(info.profile_picture),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded,
    NotFound,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOutcome {
    Saved,
    Failed,
}

/// External collaborators the controller talks to.
#[derive(Clone)]
pub struct ProfileCapabilities {
    pub store: Arc<dyn ProfileStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub notifier: Arc<dyn Notifier>,
    pub busy: Arc<dyn BusySignal>,
    pub picture_collection: String,
}

pub struct ProfileViewController {
    user_id: String,
    caps: ProfileCapabilities,
    state: RwLock<ProfileRecord>,
    editors: RwLock<EditorState>,
}

impl ProfileViewController {
    pub fn new(user_id: impl Into<String>, caps: ProfileCapabilities) -> Self {
        Self {
            user_id: user_id.into(),
            caps,
            state: RwLock::new(ProfileRecord::default()),
            editors: RwLock::new(EditorState::default()),
        }
    }

    pub async fn state(&self) -> ProfileRecord {
        self.state.read().await.clone()
    }

    pub async fn editors(&self) -> EditorState {
        *self.editors.read().await
    }

    pub fn is_busy(&self) -> bool {
        self.caps.busy.is_busy()
    }

    pub async fn open_editor(&self, editor: Editor) {
        self.editors.write().await.set(editor, true);
    }

    pub async fn close_editor(&self, editor: Editor) {
        self.editors.write().await.set(editor, false);
    }

    /// Values the personal-info form starts from.
    pub async fn personal_form_initial_values(&self) -> PersonalInfo {
        self.state.read().await.personal_info()
    }

    /// Values the showcase form starts from.
    pub async fn show_case_form_initial_values(&self) -> ShowCase {
        self.state.read().await.show_case.clone()
    }

    /// Fetches the profile and replaces the local state with it.
    #[instrument(name = "profile.load", skip(self), fields(user_id = %self.user_id))]
    pub async fn load(&self) -> LoadOutcome {
        match self.caps.store.read(&self.user_id).await {
            Ok(record) => {
                *self.state.write().await = record;
                LoadOutcome::Loaded
            }
            Err(ProfileStoreError::NotFound) => {
                warn!("profile document missing");
                self.caps
                    .notifier
                    .notify(USER_NOT_FOUND_MESSAGE, Severity::Error)
                    .await;
                LoadOutcome::NotFound
            }
            Err(error) => {
                error!(%error, "failed to load profile");
                self.caps
                    .notifier
                    .notify(GENERAL_ERROR_MESSAGE, Severity::Error)
                    .await;
                LoadOutcome::Failed
            }
        }
    }

    /// Saves the personal-info form, uploading a newly chosen picture first.
    #[instrument(name = "profile.submit_personal_info", skip_all, fields(user_id = %self.user_id))]
    pub async fn submit_personal_info(&self, edit: PersonalInfoEdit) -> SubmitOutcome {
        let _busy = BusyGuard::raise(Arc::clone(&self.caps.busy));

        let picture_url = match &edit.profile_picture {
            ProfilePicture::Uploaded(url) => url.clone(),
            ProfilePicture::Pending(file) => match self.upload_picture(file).await {
                Ok(url) => url,
                Err(error) => {
                    error!(%error, file_name = %file.name, "failed to upload profile picture");
                    self.caps
                        .notifier
                        .notify(GENERAL_ERROR_MESSAGE, Severity::Error)
                        .await;
                    return SubmitOutcome::Failed;
                }
            },
        };

        let info = edit.into_personal_info(picture_url);
        self.write_field_group(FieldGroup::PersonalInfo(info)).await
    }

    /// Saves the showcase form.
    #[instrument(name = "profile.submit_show_case", skip_all, fields(user_id = %self.user_id))]
    pub async fn submit_show_case(&self, show_case: ShowCase) -> SubmitOutcome {
        let _busy = BusyGuard::raise(Arc::clone(&self.caps.busy));
        self.write_field_group(FieldGroup::ShowCase { show_case })
            .await
    }

    async fn upload_picture(&self, file: &PendingFile) -> Result<String, BlobStoreError> {
        let path = BlobPath::new(&self.caps.picture_collection, &self.user_id, &file.name)?;
        self.caps.blobs.put(&path, file.bytes.clone()).await?;
        let url = self.caps.blobs.url(&path).await?;
        info!(blob = %path, "uploaded profile picture");
        Ok(url)
    }

    async fn write_field_group(&self, group: FieldGroup) -> SubmitOutcome {
        match self.caps.store.partial_update(&self.user_id, &group).await {
            Ok(()) => {
                info!(group = group.name(), "profile updated");
                self.caps
                    .notifier
                    .notify(CHANGES_SAVED_MESSAGE, Severity::Success)
                    .await;
                // The refreshed state must be in place before the editors close.
                self.load().await;
                *self.editors.write().await = EditorState::default();
                SubmitOutcome::Saved
            }
            Err(error) => {
                error!(%error, group = group.name(), "failed to update profile");
                self.caps
                    .notifier
                    .notify(GENERAL_ERROR_MESSAGE, Severity::Error)
                    .await;
                SubmitOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex as StdMutex,
        atomic::{AtomicBool, Ordering},
    };

    use async_trait::async_trait;

    use super::*;
    use crate::services::busy::BusyFlag;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Read,
        Update(FieldGroup),
        Put(String),
        Url(String),
        Notify(String, Severity),
        Editors(EditorState),
    }

    type Log = Arc<StdMutex<Vec<Call>>>;

    struct FakeStore {
        log: Log,
        records: StdMutex<std::collections::HashMap<String, ProfileRecord>>,
        fail_read: AtomicBool,
        fail_update: bool,
    }

    #[async_trait]
    impl ProfileStore for FakeStore {
        async fn read(&self, user_id: &str) -> Result<ProfileRecord, ProfileStoreError> {
            self.log.lock().unwrap().push(Call::Read);
            if self.fail_read.load(Ordering::SeqCst) {
                return Err(ProfileStoreError::Backend("offline".into()));
            }
            self.records
                .lock()
                .unwrap()
                .get(user_id)
                .cloned()
                .ok_or(ProfileStoreError::NotFound)
        }

        async fn partial_update(
            &self,
            user_id: &str,
            group: &FieldGroup,
        ) -> Result<(), ProfileStoreError> {
            self.log.lock().unwrap().push(Call::Update(group.clone()));
            if self.fail_update {
                return Err(ProfileStoreError::Backend("write rejected".into()));
            }
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(user_id)
                .ok_or(ProfileStoreError::NotFound)?;
            match group {
                FieldGroup::PersonalInfo(info) => {
                    record.first_name = info.first_name.clone();
                    record.last_name = info.last_name.clone();
                    record.email = info.email.clone();
                    record.about = info.about.clone();
                    record.profile_picture = info.profile_picture.clone();
                }
                FieldGroup::ShowCase { show_case } => record.show_case = show_case.clone(),
            }
            Ok(())
        }
    }

    struct FakeBlobs {
        log: Log,
        base: String,
        fail_put: bool,
        fail_url: bool,
    }

    #[async_trait]
    impl BlobStore for FakeBlobs {
        async fn put(&self, path: &BlobPath, _bytes: Bytes) -> Result<(), BlobStoreError> {
            self.log.lock().unwrap().push(Call::Put(path.to_string()));
            if self.fail_put {
                return Err(BlobStoreError::Transport("quota exceeded".into()));
            }
            Ok(())
        }

        async fn url(&self, path: &BlobPath) -> Result<String, BlobStoreError> {
            self.log.lock().unwrap().push(Call::Url(path.to_string()));
            if self.fail_url {
                return Err(BlobStoreError::NotFound(path.to_string()));
            }
            Ok(format!("{}/{}", self.base, path))
        }
    }

    struct FakeNotifier {
        log: Log,
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn notify(&self, message: &str, severity: Severity) {
            self.log
                .lock()
                .unwrap()
                .push(Call::Notify(message.to_owned(), severity));
        }
    }

    struct Harness {
        log: Log,
        store: Arc<FakeStore>,
        busy: Arc<BusyFlag>,
        controller: ProfileViewController,
    }

    #[derive(Default)]
    struct Options {
        fail_read: bool,
        fail_update: bool,
        fail_put: bool,
        fail_url: bool,
        missing: bool,
    }

    fn ann() -> ProfileRecord {
        ProfileRecord {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: "ann@example.com".into(),
            about: "Hi".into(),
            profile_picture: "https://cdn/old.png".into(),
            show_case: ShowCase::default(),
        }
    }

    fn harness(options: Options) -> Harness {
        let log: Log = Arc::default();
        let mut records = std::collections::HashMap::new();
        if !options.missing {
            records.insert("u1".to_string(), ann());
        }
        let store = Arc::new(FakeStore {
            log: log.clone(),
            records: StdMutex::new(records),
            fail_read: AtomicBool::new(options.fail_read),
            fail_update: options.fail_update,
        });
        let blobs = Arc::new(FakeBlobs {
            log: log.clone(),
            base: "https://cdn".into(),
            fail_put: options.fail_put,
            fail_url: options.fail_url,
        });
        let busy = Arc::new(BusyFlag::new());
        let caps = ProfileCapabilities {
            store: store.clone(),
            blobs,
            notifier: Arc::new(FakeNotifier { log: log.clone() }),
            busy: busy.clone(),
            picture_collection: DEFAULT_PICTURE_COLLECTION.into(),
        };
        Harness {
            log,
            store,
            busy,
            controller: ProfileViewController::new("u1", caps),
        }
    }

    fn calls(h: &Harness) -> Vec<Call> {
        h.log.lock().unwrap().clone()
    }

    fn notifications(h: &Harness) -> Vec<(String, Severity)> {
        calls(h)
            .into_iter()
            .filter_map(|c| match c {
                Call::Notify(m, s) => Some((m, s)),
                _ => None,
            })
            .collect()
    }

    fn edit_with_url(url: &str) -> PersonalInfoEdit {
        PersonalInfoEdit {
            first_name: "Anna".into(),
            last_name: "Lee".into(),
            email: "anna@example.com".into(),
            about: "Hello".into(),
            profile_picture: ProfilePicture::Uploaded(url.into()),
        }
    }

    fn edit_with_file(name: &str) -> PersonalInfoEdit {
        PersonalInfoEdit {
            profile_picture: ProfilePicture::Pending(PendingFile {
                name: name.into(),
                bytes: Bytes::from_static(b"png-bytes"),
            }),
            ..edit_with_url("")
        }
    }

    #[tokio::test]
    async fn load_replaces_state_with_fetched_record() {
        let h = harness(Options::default());
        assert_eq!(h.controller.load().await, LoadOutcome::Loaded);
        assert_eq!(h.controller.state().await, ann());
        assert!(notifications(&h).is_empty());
    }

    #[tokio::test]
    async fn load_of_missing_user_alerts_and_keeps_state() {
        let h = harness(Options {
            missing: true,
            ..Options::default()
        });
        assert_eq!(h.controller.load().await, LoadOutcome::NotFound);
        assert_eq!(h.controller.state().await, ProfileRecord::default());
        assert_eq!(
            notifications(&h),
            [(USER_NOT_FOUND_MESSAGE.to_string(), Severity::Error)]
        );
    }

    #[tokio::test]
    async fn load_failure_alerts_generic_error() {
        let h = harness(Options {
            fail_read: true,
            ..Options::default()
        });
        assert_eq!(h.controller.load().await, LoadOutcome::Failed);
        assert_eq!(
            notifications(&h),
            [(GENERAL_ERROR_MESSAGE.to_string(), Severity::Error)]
        );
    }

    #[tokio::test]
    async fn failed_reload_keeps_previously_loaded_state() {
        let h = harness(Options::default());
        assert_eq!(h.controller.load().await, LoadOutcome::Loaded);

        h.store.fail_read.store(true, Ordering::SeqCst);
        assert_eq!(h.controller.load().await, LoadOutcome::Failed);
        assert_eq!(h.controller.state().await, ann());

        h.store.fail_read.store(false, Ordering::SeqCst);
        h.store.records.lock().unwrap().remove("u1");
        assert_eq!(h.controller.load().await, LoadOutcome::NotFound);
        assert_eq!(h.controller.state().await, ann());

        assert_eq!(
            notifications(&h),
            [
                (GENERAL_ERROR_MESSAGE.to_string(), Severity::Error),
                (USER_NOT_FOUND_MESSAGE.to_string(), Severity::Error),
            ]
        );
    }

    #[tokio::test]
    async fn url_picture_updates_directly_without_blob_calls() {
        let h = harness(Options::default());
        h.controller.load().await;
        h.controller.open_editor(Editor::PersonalInfo).await;

        let outcome = h
            .controller
            .submit_personal_info(edit_with_url("https://cdn/x.png"))
            .await;

        assert_eq!(outcome, SubmitOutcome::Saved);
        let calls = calls(&h);
        assert!(
            !calls
                .iter()
                .any(|c| matches!(c, Call::Put(_) | Call::Url(_)))
        );
        let written = calls.iter().find_map(|c| match c {
            Call::Update(FieldGroup::PersonalInfo(info)) => Some(info.clone()),
            _ => None,
        });
        assert_eq!(written.unwrap().profile_picture, "https://cdn/x.png");
        assert_eq!(
            notifications(&h),
            [(CHANGES_SAVED_MESSAGE.to_string(), Severity::Success)]
        );
        assert!(!h.controller.editors().await.personal_info_open);
        assert_eq!(h.controller.state().await.first_name, "Anna");
        assert!(!h.busy.is_busy());
    }

    #[tokio::test]
    async fn file_picture_is_uploaded_before_the_write() {
        let h = harness(Options::default());
        h.controller.load().await;

        let outcome = h
            .controller
            .submit_personal_info(edit_with_file("pic.png"))
            .await;

        assert_eq!(outcome, SubmitOutcome::Saved);
        let calls = calls(&h);
        let put = calls
            .iter()
            .position(|c| matches!(c, Call::Put(_)))
            .unwrap();
        let update = calls
            .iter()
            .position(|c| matches!(c, Call::Update(_)))
            .unwrap();
        assert!(put < update);
        assert_eq!(calls[put], Call::Put("profile_pictures/u1/pic.png".into()));

        let Call::Update(FieldGroup::PersonalInfo(info)) = &calls[update] else {
            panic!("expected personal info write, got {:?}", calls[update]);
        };
        assert_eq!(
            info.profile_picture,
            "https://cdn/profile_pictures/u1/pic.png"
        );
        assert_eq!(
            h.controller.state().await.profile_picture,
            "https://cdn/profile_pictures/u1/pic.png"
        );
        assert!(!h.busy.is_busy());
    }

    #[tokio::test]
    async fn failed_upload_never_writes_the_document() {
        let h = harness(Options {
            fail_put: true,
            ..Options::default()
        });
        h.controller.open_editor(Editor::PersonalInfo).await;

        let outcome = h
            .controller
            .submit_personal_info(edit_with_file("pic.png"))
            .await;

        assert_eq!(outcome, SubmitOutcome::Failed);
        assert!(!calls(&h).iter().any(|c| matches!(c, Call::Update(_))));
        assert_eq!(
            notifications(&h),
            [(GENERAL_ERROR_MESSAGE.to_string(), Severity::Error)]
        );
        assert!(h.controller.editors().await.personal_info_open);
        assert!(!h.busy.is_busy());
    }

    #[tokio::test]
    async fn failed_url_lookup_never_writes_the_document() {
        let h = harness(Options {
            fail_url: true,
            ..Options::default()
        });

        let outcome = h
            .controller
            .submit_personal_info(edit_with_file("pic.png"))
            .await;

        assert_eq!(outcome, SubmitOutcome::Failed);
        let calls = calls(&h);
        assert!(calls.iter().any(|c| matches!(c, Call::Put(_))));
        assert!(!calls.iter().any(|c| matches!(c, Call::Update(_))));
        assert!(!h.busy.is_busy());
    }

    #[tokio::test]
    async fn invalid_file_name_fails_without_blob_or_document_calls() {
        let h = harness(Options::default());

        let outcome = h
            .controller
            .submit_personal_info(edit_with_file("../escape.png"))
            .await;

        assert_eq!(outcome, SubmitOutcome::Failed);
        assert!(
            !calls(&h)
                .iter()
                .any(|c| matches!(c, Call::Put(_) | Call::Update(_)))
        );
        assert!(!h.busy.is_busy());
    }

    #[tokio::test]
    async fn failed_write_keeps_editor_open_and_clears_busy() {
        let h = harness(Options {
            fail_update: true,
            ..Options::default()
        });
        h.controller.load().await;
        h.controller.open_editor(Editor::ShowCase).await;

        let outcome = h
            .controller
            .submit_show_case(ShowCase {
                github: "https://github.com/ann".into(),
                ..ShowCase::default()
            })
            .await;

        assert_eq!(outcome, SubmitOutcome::Failed);
        assert!(h.controller.editors().await.show_case_open);
        assert_eq!(h.controller.state().await, ann());
        assert!(!h.busy.is_busy());
        assert_eq!(
            notifications(&h),
            [(GENERAL_ERROR_MESSAGE.to_string(), Severity::Error)]
        );
    }

    #[tokio::test]
    async fn show_case_submit_writes_only_show_case_then_reloads() {
        let h = harness(Options::default());
        h.controller.load().await;
        h.controller.open_editor(Editor::ShowCase).await;
        let show_case = ShowCase {
            linked_in: "https://linkedin.com/in/ann".into(),
            ..ShowCase::default()
        };

        let outcome = h.controller.submit_show_case(show_case.clone()).await;

        assert_eq!(outcome, SubmitOutcome::Saved);
        let calls = calls(&h);
        let update = calls
            .iter()
            .position(|c| matches!(c, Call::Update(_)))
            .unwrap();
        assert_eq!(
            calls[update],
            Call::Update(FieldGroup::ShowCase {
                show_case: show_case.clone()
            })
        );
        assert!(calls[update..].contains(&Call::Read));
        assert_eq!(h.controller.state().await.show_case, show_case);
        assert_eq!(h.controller.editors().await, EditorState::default());
    }

    #[tokio::test]
    async fn form_initial_values_follow_loaded_state() {
        let h = harness(Options::default());
        h.controller.load().await;

        let personal = h.controller.personal_form_initial_values().await;
        assert_eq!(personal, ann().personal_info());
        assert_eq!(
            h.controller.show_case_form_initial_values().await,
            ShowCase::default()
        );
    }

    /// Records the editor state every time the store is read, so the test can
    /// check that the reload observed the editor still open.
    struct ObservingStore {
        inner: FakeStore,
        controller: StdMutex<Option<std::sync::Weak<ProfileViewController>>>,
    }

    #[async_trait]
    impl ProfileStore for ObservingStore {
        async fn read(&self, user_id: &str) -> Result<ProfileRecord, ProfileStoreError> {
            let controller = self
                .controller
                .lock()
                .unwrap()
                .as_ref()
                .and_then(std::sync::Weak::upgrade);
            if let Some(controller) = controller {
                let editors = controller.editors().await;
                self.inner.log.lock().unwrap().push(Call::Editors(editors));
            }
            self.inner.read(user_id).await
        }

        async fn partial_update(
            &self,
            user_id: &str,
            group: &FieldGroup,
        ) -> Result<(), ProfileStoreError> {
            self.inner.partial_update(user_id, group).await
        }
    }

    #[tokio::test]
    async fn reload_happens_before_editor_closes() {
        let log: Log = Arc::default();
        let mut records = std::collections::HashMap::new();
        records.insert("u1".to_string(), ann());
        let store = Arc::new(ObservingStore {
            inner: FakeStore {
                log: log.clone(),
                records: StdMutex::new(records),
                fail_read: AtomicBool::new(false),
                fail_update: false,
            },
            controller: StdMutex::new(None),
        });
        let caps = ProfileCapabilities {
            store: store.clone(),
            blobs: Arc::new(FakeBlobs {
                log: log.clone(),
                base: "https://cdn".into(),
                fail_put: false,
                fail_url: false,
            }),
            notifier: Arc::new(FakeNotifier { log: log.clone() }),
            busy: Arc::new(BusyFlag::new()),
            picture_collection: DEFAULT_PICTURE_COLLECTION.into(),
        };
        let controller = Arc::new(ProfileViewController::new("u1", caps));
        *store.controller.lock().unwrap() = Some(Arc::downgrade(&controller));

        controller.open_editor(Editor::PersonalInfo).await;
        controller
            .submit_personal_info(edit_with_url("https://cdn/x.png"))
            .await;

        let observed: Vec<_> = log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                Call::Editors(state) => Some(*state),
                _ => None,
            })
            .collect();
        assert_eq!(observed.len(), 1);
        assert!(observed[0].personal_info_open);
        assert!(!controller.editors().await.personal_info_open);
    }
}
