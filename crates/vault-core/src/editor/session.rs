//! Edit session: load, edit, save and delete one cipher.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::EditorConfig;
use crate::editor::form::{FolderOptions, FormState};
use crate::editor::messages;
use crate::error::{Error, Result};
use crate::models::{Cipher, CipherId};
use crate::services::{BusyGuard, Collaborators, Dialogs, EditorEvent, StoreError};
use crate::util::non_blank;

/// Lifecycle of an edit session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the cipher to load
    Loading,
    /// Form is editable
    Ready,
    /// Update request in flight
    Saving,
    /// Delete request in flight
    Deleting,
    /// Saved, deleted, cancelled or failed to load
    Closed,
    /// No cipher exists for the requested ID
    NotFound,
}

/// Result of a save or delete trigger that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Storage accepted the change and the session is closed
    Completed,
    /// The user declined the confirmation prompt
    Cancelled,
    /// The trigger was dropped: debounced, re-entrant or session not ready
    Ignored,
}

struct Loaded {
    cipher: Cipher,
    form: FormState,
    folders: Arc<FolderOptions>,
}

/// One editing session for a single cipher.
///
/// Created in [`SessionState::Loading`]; [`EditSession::load`] moves it to
/// `Ready`. Save and delete run at most one at a time and close the session
/// when storage accepts them.
pub struct EditSession {
    cipher_id: CipherId,
    services: Collaborators,
    config: EditorConfig,
    state: SessionState,
    loaded: Option<Loaded>,
    last_save_trigger: Option<Instant>,
}

impl EditSession {
    /// Create a session that still has to be loaded
    pub fn new(cipher_id: CipherId, services: Collaborators, config: EditorConfig) -> Self {
        Self {
            cipher_id,
            services,
            config,
            state: SessionState::Loading,
            loaded: None,
            last_save_trigger: None,
        }
    }

    /// Create and load a session
    pub async fn open(
        cipher_id: CipherId,
        services: Collaborators,
        config: EditorConfig,
    ) -> Result<Self> {
        let mut session = Self::new(cipher_id, services, config);
        session.load().await?;
        Ok(session)
    }

    pub const fn cipher_id(&self) -> CipherId {
        self.cipher_id
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Current form, once loaded and until the session closes
    pub fn form(&self) -> Option<&FormState> {
        self.loaded.as_ref().map(|loaded| &loaded.form)
    }

    /// Mutable form; only available while the session is `Ready`
    pub fn form_mut(&mut self) -> Result<&mut FormState> {
        Ok(&mut self.ready()?.form)
    }

    /// Folder picker entries shared with the rendering layer
    pub fn folders(&self) -> Option<Arc<FolderOptions>> {
        self.loaded.as_ref().map(|loaded| Arc::clone(&loaded.folders))
    }

    /// The cipher as it was loaded
    pub fn cipher(&self) -> Option<&Cipher> {
        self.loaded.as_ref().map(|loaded| &loaded.cipher)
    }

    /// Fetch the cipher and folders, decrypt them and build the form
    pub async fn load(&mut self) -> Result<&FormState> {
        if self.state != SessionState::Loading {
            return Err(Error::InvalidState(format!(
                "cannot load a session in {:?} state",
                self.state
            )));
        }

        match self.fetch().await {
            Ok(loaded) => {
                self.state = SessionState::Ready;
                tracing::info!(cipher_id = %self.cipher_id, "Edit session ready");
                if !self.services.connectivity.is_connected() {
                    self.alert_no_connection();
                }
                Ok(&self.loaded.insert(loaded).form)
            }
            Err(error) => {
                self.state = if matches!(error, Error::NotFound(_)) {
                    SessionState::NotFound
                } else {
                    SessionState::Closed
                };
                tracing::warn!(cipher_id = %self.cipher_id, "Failed to load cipher: {error}");
                self.services
                    .dialogs
                    .alert(messages::ERROR_TITLE, &error.to_string());
                Err(error)
            }
        }
    }

    async fn fetch(&self) -> Result<Loaded> {
        let store = &self.services.store;
        let crypto = self.services.crypto.as_ref();

        let cipher = store
            .get_cipher(&self.cipher_id)
            .await?
            .ok_or_else(|| Error::NotFound(self.cipher_id.to_string()))?;
        let folders = FolderOptions::build(store.list_folders().await?, crypto)?;
        let form = FormState::project(&cipher, &folders, crypto)?;

        Ok(Loaded {
            cipher,
            form,
            folders: Arc::new(folders),
        })
    }

    /// Validate the form and send the updated cipher to storage
    pub async fn save(&mut self) -> Result<ActionOutcome> {
        if self.state != SessionState::Ready {
            tracing::debug!(state = ?self.state, "Ignoring save trigger");
            return Ok(ActionOutcome::Ignored);
        }

        let now = Instant::now();
        if let Some(last) = self.last_save_trigger {
            if now.duration_since(last) < self.config.save_debounce() {
                tracing::debug!("Ignoring save trigger inside debounce window");
                return Ok(ActionOutcome::Ignored);
            }
        }
        self.last_save_trigger = Some(now);

        if !self.services.connectivity.is_connected() {
            self.alert_no_connection();
            return Err(Error::NoConnection);
        }

        let cipher = match self.build_record() {
            Ok(cipher) => cipher,
            Err(error) => {
                self.services
                    .dialogs
                    .alert(messages::ERROR_TITLE, &error.to_string());
                return Err(error);
            }
        };

        let services = self.services.clone();
        let flight = InFlight::begin(&mut self.state, SessionState::Saving);
        let result = {
            let _busy = BusyGuard::show(services.dialogs.as_ref(), messages::SAVING);
            services.store.update_cipher(&cipher).await
        };

        match result {
            Ok(()) => {
                flight.settle(SessionState::Closed);
                self.loaded = None;
                tracing::info!(cipher_id = %self.cipher_id, "Cipher updated");
                services.dialogs.toast(messages::ITEM_UPDATED);
                services.events.emit(EditorEvent::EditedLogin);
                Ok(ActionOutcome::Completed)
            }
            Err(error) => {
                drop(flight);
                Err(report_store_failure(services.dialogs.as_ref(), error))
            }
        }
    }

    fn build_record(&self) -> Result<Cipher> {
        let loaded = self
            .loaded
            .as_ref()
            .ok_or_else(|| Error::InvalidState("session has no form".to_string()))?;
        loaded.form.validate()?;
        loaded.form.to_record(
            &loaded.cipher,
            &loaded.folders,
            self.services.crypto.as_ref(),
        )
    }

    /// Ask for confirmation and delete the cipher
    pub async fn delete(&mut self) -> Result<ActionOutcome> {
        if self.state != SessionState::Ready {
            tracing::debug!(state = ?self.state, "Ignoring delete trigger");
            return Ok(ActionOutcome::Ignored);
        }

        if !self.services.connectivity.is_connected() {
            self.alert_no_connection();
            return Err(Error::NoConnection);
        }

        let services = self.services.clone();
        if !services.dialogs.confirm(messages::CONFIRM_DELETE).await {
            return Ok(ActionOutcome::Cancelled);
        }

        let cipher_id = self.cipher_id;
        let flight = InFlight::begin(&mut self.state, SessionState::Deleting);
        let result = {
            let _busy = BusyGuard::show(services.dialogs.as_ref(), messages::DELETING);
            services.store.delete_cipher(&cipher_id).await
        };

        match result {
            Ok(()) => {
                flight.settle(SessionState::Closed);
                self.loaded = None;
                tracing::info!(cipher_id = %cipher_id, "Cipher deleted");
                services.dialogs.toast(messages::ITEM_DELETED);
                services.events.emit(EditorEvent::DeletedLogin);
                Ok(ActionOutcome::Completed)
            }
            Err(error) => {
                drop(flight);
                Err(report_store_failure(services.dialogs.as_ref(), error))
            }
        }
    }

    /// Put a generated password into the form.
    ///
    /// Overwriting a non-blank password needs confirmation. Returns whether
    /// the form changed.
    pub async fn apply_generated_password(&mut self, password: &str) -> Result<bool> {
        let dialogs = Arc::clone(&self.services.dialogs);
        let form = &mut self.ready()?.form;

        if non_blank(&form.password).is_some()
            && !dialogs.confirm(messages::CONFIRM_PASSWORD_OVERWRITE).await
        {
            return Ok(false);
        }

        form.password = password.to_string();
        dialogs.toast(messages::PASSWORD_GENERATED);
        Ok(true)
    }

    /// Put a scanned authenticator key into the form.
    ///
    /// A blank scan result leaves the form untouched and alerts the user.
    pub fn apply_scanned_totp(&mut self, key: Option<&str>) -> Result<bool> {
        let dialogs = Arc::clone(&self.services.dialogs);
        let form = &mut self.ready()?.form;

        match key.and_then(non_blank) {
            Some(key) => {
                form.totp = key.to_string();
                dialogs.toast(messages::AUTHENTICATOR_KEY_ADDED);
                Ok(true)
            }
            None => {
                dialogs.alert(messages::ERROR_TITLE, messages::AUTHENTICATOR_KEY_READ_ERROR);
                Ok(false)
            }
        }
    }

    /// Leave the session without saving; the form is discarded
    pub fn close(&mut self) {
        if self.state == SessionState::NotFound {
            return;
        }
        tracing::debug!(cipher_id = %self.cipher_id, "Edit session closed");
        self.state = SessionState::Closed;
        self.loaded = None;
    }

    fn ready(&mut self) -> Result<&mut Loaded> {
        if self.state != SessionState::Ready {
            return Err(Error::InvalidState(format!(
                "form is not editable in {:?} state",
                self.state
            )));
        }
        self.loaded
            .as_mut()
            .ok_or_else(|| Error::InvalidState("session has no form".to_string()))
    }

    fn alert_no_connection(&self) {
        self.services
            .dialogs
            .alert(messages::NO_CONNECTION_TITLE, messages::NO_CONNECTION_MESSAGE);
    }
}

/// Surface a storage failure and turn it into the session error
fn report_store_failure(dialogs: &dyn Dialogs, error: StoreError) -> Error {
    tracing::warn!("Storage request failed: {:?}", error.messages);
    let message = error
        .messages
        .first()
        .map_or(messages::GENERIC_ERROR, String::as_str);
    dialogs.alert(messages::ERROR_TITLE, message);
    error.into()
}

/// Marks an operation as in flight.
///
/// The session goes back to `Ready` when the guard is dropped without being
/// settled, including when the operation future itself is dropped.
struct InFlight<'a> {
    state: &'a mut SessionState,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a mut SessionState, in_flight: SessionState) -> Self {
        *state = in_flight;
        Self {
            state,
            settled: false,
        }
    }

    fn settle(mut self, next: SessionState) {
        *self.state = next;
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            *self.state = SessionState::Ready;
        }
    }
}

/// An edit session shared between UI event handlers.
///
/// Save and delete triggers that arrive while another operation holds the
/// session are ignored instead of queued.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<EditSession>>,
}

impl SharedSession {
    pub fn new(session: EditSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub async fn save(&self) -> Result<ActionOutcome> {
        let Ok(mut session) = self.inner.try_lock() else {
            tracing::debug!("Ignoring save trigger while an operation is in flight");
            return Ok(ActionOutcome::Ignored);
        };
        session.save().await
    }

    pub async fn delete(&self) -> Result<ActionOutcome> {
        let Ok(mut session) = self.inner.try_lock() else {
            tracing::debug!("Ignoring delete trigger while an operation is in flight");
            return Ok(ActionOutcome::Ignored);
        };
        session.delete().await
    }

    /// Apply an edit to the form once no operation is in flight
    pub async fn edit<R>(&self, apply: impl FnOnce(&mut FormState) -> R) -> Result<R> {
        let mut session = self.inner.lock().await;
        Ok(apply(session.form_mut()?))
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use tokio::sync::Notify;

    use super::*;
    use crate::crypto::{CryptoService, EncString, KeyRing};
    use crate::error::{FormField, ValidationError};
    use crate::models::{Folder, FolderId, LoginDetail, Scope};
    use crate::services::{CipherStore, Connectivity, EventSink, StoreResult};

    #[derive(Default)]
    struct MemoryStore {
        ciphers: StdMutex<HashMap<CipherId, Cipher>>,
        folders: StdMutex<Vec<Folder>>,
        updates: AtomicUsize,
        deletes: AtomicUsize,
        failure: StdMutex<Option<StoreError>>,
        gate: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl MemoryStore {
        fn fail_with(&self, error: StoreError) {
            *self.failure.lock().unwrap() = Some(error);
        }

        fn stored(&self, id: &CipherId) -> Option<Cipher> {
            self.ciphers.lock().unwrap().get(id).cloned()
        }

        async fn pass_gate(&self) {
            if let Some((started, release)) = &self.gate {
                started.notify_one();
                release.notified().await;
            }
        }

        fn take_failure(&self) -> StoreResult<()> {
            self.failure.lock().unwrap().take().map_or(Ok(()), Err)
        }
    }

    #[async_trait]
    impl CipherStore for MemoryStore {
        async fn get_cipher(&self, id: &CipherId) -> StoreResult<Option<Cipher>> {
            Ok(self.stored(id))
        }

        async fn list_folders(&self) -> StoreResult<Vec<Folder>> {
            Ok(self.folders.lock().unwrap().clone())
        }

        async fn update_cipher(&self, cipher: &Cipher) -> StoreResult<()> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.pass_gate().await;
            self.take_failure()?;
            self.ciphers.lock().unwrap().insert(cipher.id, cipher.clone());
            Ok(())
        }

        async fn delete_cipher(&self, id: &CipherId) -> StoreResult<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.pass_gate().await;
            self.take_failure()?;
            self.ciphers.lock().unwrap().remove(id);
            Ok(())
        }
    }

    struct Switch(AtomicBool);

    impl Connectivity for Switch {
        fn is_connected(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct RecordingDialogs {
        answer: AtomicBool,
        prompts: StdMutex<Vec<String>>,
        alerts: StdMutex<Vec<(String, String)>>,
        toasts: StdMutex<Vec<String>>,
        busy_shown: AtomicUsize,
        busy_hidden: AtomicUsize,
    }

    impl RecordingDialogs {
        fn alerts(&self) -> Vec<(String, String)> {
            self.alerts.lock().unwrap().clone()
        }

        fn toasts(&self) -> Vec<String> {
            self.toasts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Dialogs for RecordingDialogs {
        async fn confirm(&self, prompt: &str) -> bool {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answer.load(Ordering::SeqCst)
        }

        fn alert(&self, title: &str, message: &str) {
            self.alerts
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string()));
        }

        fn toast(&self, message: &str) {
            self.toasts.lock().unwrap().push(message.to_string());
        }

        fn show_busy(&self, _message: &str) {
            self.busy_shown.fetch_add(1, Ordering::SeqCst);
        }

        fn hide_busy(&self) {
            self.busy_hidden.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct RecordingEvents(StdMutex<Vec<EditorEvent>>);

    impl EventSink for RecordingEvents {
        fn emit(&self, event: EditorEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    struct Harness {
        keys: Arc<KeyRing>,
        store: Arc<MemoryStore>,
        online: Arc<Switch>,
        dialogs: Arc<RecordingDialogs>,
        events: Arc<RecordingEvents>,
        cipher_id: CipherId,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_store(MemoryStore::default())
        }

        fn gated() -> (Self, Arc<Notify>, Arc<Notify>) {
            let started = Arc::new(Notify::new());
            let release = Arc::new(Notify::new());
            let store = MemoryStore {
                gate: Some((Arc::clone(&started), Arc::clone(&release))),
                ..MemoryStore::default()
            };
            (Self::with_store(store), started, release)
        }

        fn with_store(store: MemoryStore) -> Self {
            let keys = KeyRing::generate();
            let seal = |value: &str| keys.encrypt(value, &Scope::Personal).unwrap();

            let mut cipher = Cipher::new(seal("Gmail"));
            cipher.login = Some(LoginDetail {
                username: Some(seal("me@example.com")),
                password: Some(seal("old")),
                ..LoginDetail::default()
            });
            let cipher_id = cipher.id;
            store.ciphers.lock().unwrap().insert(cipher_id, cipher);

            Self {
                keys: Arc::new(keys),
                store: Arc::new(store),
                online: Arc::new(Switch(AtomicBool::new(true))),
                dialogs: Arc::new(RecordingDialogs::default()),
                events: Arc::new(RecordingEvents::default()),
                cipher_id,
            }
        }

        fn services(&self) -> Collaborators {
            Collaborators {
                store: self.store.clone(),
                crypto: self.keys.clone(),
                connectivity: self.online.clone(),
                dialogs: self.dialogs.clone(),
                events: self.events.clone(),
            }
        }

        fn add_folder(&self, name: &str) -> FolderId {
            let folder = Folder::new(self.keys.encrypt(name, &Scope::Personal).unwrap());
            let id = folder.id;
            self.store.folders.lock().unwrap().push(folder);
            id
        }

        async fn open(&self) -> EditSession {
            EditSession::open(self.cipher_id, self.services(), EditorConfig::default())
                .await
                .unwrap()
        }

        fn set_online(&self, online: bool) {
            self.online.0.store(online, Ordering::SeqCst);
        }

        fn answer_confirmations(&self, answer: bool) {
            self.dialogs.answer.store(answer, Ordering::SeqCst);
        }

        fn open_field(&self, value: &EncString) -> String {
            self.keys.decrypt(value, &Scope::Personal).unwrap()
        }

        fn updates(&self) -> usize {
            self.store.updates.load(Ordering::SeqCst)
        }

        fn deletes(&self) -> usize {
            self.store.deletes.load(Ordering::SeqCst)
        }

        fn events(&self) -> Vec<EditorEvent> {
            self.events.0.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn new_session_starts_loading() {
        let harness = Harness::new();
        let mut session =
            EditSession::new(harness.cipher_id, harness.services(), EditorConfig::default());

        assert_eq!(session.state(), SessionState::Loading);
        assert!(session.form().is_none());
        assert_eq!(session.save().await.unwrap(), ActionOutcome::Ignored);
        assert_eq!(session.delete().await.unwrap(), ActionOutcome::Ignored);
        assert_eq!(harness.updates() + harness.deletes(), 0);
    }

    #[tokio::test]
    async fn load_projects_cipher_into_form() {
        let harness = Harness::new();
        let session = harness.open().await;

        assert_eq!(session.state(), SessionState::Ready);
        let form = session.form().unwrap();
        assert_eq!(form.name, "Gmail");
        assert_eq!(form.username, "me@example.com");
        assert_eq!(form.password, "old");
        assert_eq!(form.uri, "");
        assert_eq!(form.notes, "");
        assert!(harness.dialogs.alerts().is_empty());
    }

    #[tokio::test]
    async fn load_rejects_second_call() {
        let harness = Harness::new();
        let mut session = harness.open().await;
        assert!(matches!(
            session.load().await,
            Err(Error::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn load_missing_cipher_is_terminal() {
        let harness = Harness::new();
        let mut session = EditSession::new(CipherId::new(), harness.services(), EditorConfig::default());

        let error = session.load().await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
        assert_eq!(session.state(), SessionState::NotFound);
        assert!(session.form().is_none());

        session.close();
        assert_eq!(session.state(), SessionState::NotFound);
        assert_eq!(session.save().await.unwrap(), ActionOutcome::Ignored);
        assert_eq!(harness.updates(), 0);
    }

    #[tokio::test]
    async fn load_while_offline_warns_but_stays_editable() {
        let harness = Harness::new();
        harness.set_online(false);
        let session = harness.open().await;

        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(
            harness.dialogs.alerts(),
            vec![(
                messages::NO_CONNECTION_TITLE.to_string(),
                messages::NO_CONNECTION_MESSAGE.to_string()
            )]
        );
    }

    #[tokio::test]
    async fn load_selects_the_cipher_folder() {
        let harness = Harness::new();
        harness.add_folder("Work");
        let personal = harness.add_folder("Personal");
        harness.add_folder("Banking");
        harness
            .store
            .ciphers
            .lock()
            .unwrap()
            .get_mut(&harness.cipher_id)
            .unwrap()
            .folder_id = Some(personal);

        let mut session = harness.open().await;
        let folders = session.folders().unwrap();
        let labels = folders.labels().collect::<Vec<_>>();
        assert_eq!(labels, vec![messages::FOLDER_NONE, "Banking", "Personal", "Work"]);
        assert_eq!(session.form().unwrap().selected_folder_index, 2);

        assert_eq!(session.save().await.unwrap(), ActionOutcome::Completed);
        let stored = harness.store.stored(&harness.cipher_id).unwrap();
        assert_eq!(stored.folder_id, Some(personal));
    }

    #[tokio::test]
    async fn save_edited_password() {
        let harness = Harness::new();
        let mut session = harness.open().await;

        session.form_mut().unwrap().password = "new123".to_string();
        assert_eq!(session.save().await.unwrap(), ActionOutcome::Completed);

        let stored = harness.store.stored(&harness.cipher_id).unwrap();
        let login = stored.login.unwrap();
        assert_eq!(harness.open_field(login.password.as_ref().unwrap()), "new123");
        assert_eq!(harness.open_field(&stored.name), "Gmail");
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.form().is_none());
        assert_eq!(harness.updates(), 1);
        assert_eq!(harness.events(), vec![EditorEvent::EditedLogin]);
        assert_eq!(harness.dialogs.toasts(), vec![messages::ITEM_UPDATED.to_string()]);
        assert_eq!(harness.dialogs.busy_shown.load(Ordering::SeqCst), 1);
        assert_eq!(harness.dialogs.busy_hidden.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn save_offline_never_reaches_storage() {
        let harness = Harness::new();
        let mut session = harness.open().await;
        harness.set_online(false);

        let error = session.save().await.unwrap_err();
        assert!(matches!(error, Error::NoConnection));
        assert_eq!(harness.updates(), 0);
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(harness.dialogs.alerts().len(), 1);
    }

    #[tokio::test]
    async fn save_blank_name_is_rejected_before_storage() {
        let harness = Harness::new();
        let mut session = harness.open().await;
        session.form_mut().unwrap().name = "   ".to_string();

        let error = session.save().await.unwrap_err();
        assert!(matches!(
            error,
            Error::Validation(ValidationError::RequiredFieldMissing {
                field: FormField::Name
            })
        ));
        assert_eq!(harness.updates(), 0);
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(
            harness.dialogs.alerts(),
            vec![(
                messages::ERROR_TITLE.to_string(),
                "The Name field is required.".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn save_failure_surfaces_first_message_and_stays_ready() {
        let harness = Harness::new();
        let mut session = harness.open().await;
        harness.store.fail_with(StoreError {
            messages: vec!["The item was modified elsewhere.".to_string(), "Ignored".to_string()],
        });

        let error = session.save().await.unwrap_err();
        assert!(matches!(error, Error::OperationFailed { .. }));
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.form().is_some());
        assert_eq!(
            harness.dialogs.alerts(),
            vec![(
                messages::ERROR_TITLE.to_string(),
                "The item was modified elsewhere.".to_string()
            )]
        );
        assert!(harness.events().is_empty());
        assert_eq!(harness.dialogs.busy_hidden.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn save_failure_without_messages_uses_generic_text() {
        let harness = Harness::new();
        let mut session = harness.open().await;
        harness.store.fail_with(StoreError::unspecified());

        session.save().await.unwrap_err();
        assert_eq!(
            harness.dialogs.alerts(),
            vec![(
                messages::ERROR_TITLE.to_string(),
                messages::GENERIC_ERROR.to_string()
            )]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_save_triggers_reach_storage_once() {
        let harness = Harness::new();
        let mut session = harness.open().await;
        harness.store.fail_with(StoreError::new("Server busy."));

        assert!(session.save().await.is_err());
        assert_eq!(session.save().await.unwrap(), ActionOutcome::Ignored);
        assert_eq!(harness.updates(), 1);

        tokio::time::advance(Duration::from_millis(1_001)).await;
        assert_eq!(session.save().await.unwrap(), ActionOutcome::Completed);
        assert_eq!(harness.updates(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_counts_triggers_that_fail_validation() {
        let harness = Harness::new();
        let mut session = harness.open().await;
        session.form_mut().unwrap().name.clear();

        assert!(session.save().await.is_err());
        session.form_mut().unwrap().name = "Gmail".to_string();
        assert_eq!(session.save().await.unwrap(), ActionOutcome::Ignored);
        assert_eq!(harness.updates(), 0);
    }

    #[tokio::test]
    async fn shared_session_ignores_triggers_while_in_flight() {
        let (harness, started, release) = Harness::gated();
        let shared = SharedSession::new(harness.open().await);

        let first = {
            let shared = shared.clone();
            tokio::spawn(async move { shared.save().await })
        };
        started.notified().await;

        assert_eq!(shared.save().await.unwrap(), ActionOutcome::Ignored);
        assert_eq!(shared.delete().await.unwrap(), ActionOutcome::Ignored);

        release.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), ActionOutcome::Completed);
        assert_eq!(harness.updates(), 1);
        assert_eq!(harness.deletes(), 0);
        assert_eq!(shared.state().await, SessionState::Closed);
        assert!(shared.edit(|form| form.name.clear()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_save_returns_session_to_ready() {
        let (harness, _started, _release) = Harness::gated();
        let mut session = harness.open().await;

        let timed_out = tokio::time::timeout(Duration::from_millis(50), session.save()).await;
        assert!(timed_out.is_err());

        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(harness.dialogs.busy_shown.load(Ordering::SeqCst), 1);
        assert_eq!(harness.dialogs.busy_hidden.load(Ordering::SeqCst), 1);
        assert!(harness.events().is_empty());
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let harness = Harness::new();
        let mut session = harness.open().await;
        harness.answer_confirmations(false);

        assert_eq!(session.delete().await.unwrap(), ActionOutcome::Cancelled);
        assert_eq!(harness.deletes(), 0);
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(
            *harness.dialogs.prompts.lock().unwrap(),
            vec![messages::CONFIRM_DELETE.to_string()]
        );
    }

    #[tokio::test]
    async fn delete_confirmed_removes_cipher() {
        let harness = Harness::new();
        let mut session = harness.open().await;
        harness.answer_confirmations(true);

        assert_eq!(session.delete().await.unwrap(), ActionOutcome::Completed);
        assert_eq!(harness.deletes(), 1);
        assert!(harness.store.stored(&harness.cipher_id).is_none());
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(harness.events(), vec![EditorEvent::DeletedLogin]);
        assert_eq!(harness.dialogs.toasts(), vec![messages::ITEM_DELETED.to_string()]);
        assert_eq!(session.delete().await.unwrap(), ActionOutcome::Ignored);
    }

    #[tokio::test]
    async fn delete_offline_skips_prompt_and_storage() {
        let harness = Harness::new();
        let mut session = harness.open().await;
        harness.set_online(false);
        harness.answer_confirmations(true);

        assert!(matches!(session.delete().await, Err(Error::NoConnection)));
        assert!(harness.dialogs.prompts.lock().unwrap().is_empty());
        assert_eq!(harness.deletes(), 0);
    }

    #[tokio::test]
    async fn delete_failure_keeps_session_open() {
        let harness = Harness::new();
        let mut session = harness.open().await;
        harness.answer_confirmations(true);
        harness.store.fail_with(StoreError::new("Cipher not found."));

        assert!(session.delete().await.is_err());
        assert_eq!(session.state(), SessionState::Ready);
        assert!(harness.store.stored(&harness.cipher_id).is_some());
    }

    #[tokio::test]
    async fn generated_password_overwrite_needs_confirmation() {
        let harness = Harness::new();
        let mut session = harness.open().await;

        harness.answer_confirmations(false);
        assert!(!session.apply_generated_password("Xy9!generated").await.unwrap());
        assert_eq!(session.form().unwrap().password, "old");

        harness.answer_confirmations(true);
        assert!(session.apply_generated_password("Xy9!generated").await.unwrap());
        assert_eq!(session.form().unwrap().password, "Xy9!generated");
        assert_eq!(
            harness.dialogs.toasts(),
            vec![messages::PASSWORD_GENERATED.to_string()]
        );
    }

    #[tokio::test]
    async fn generated_password_fills_blank_field_without_prompt() {
        let harness = Harness::new();
        let mut session = harness.open().await;
        session.form_mut().unwrap().password.clear();

        assert!(session.apply_generated_password("fresh").await.unwrap());
        assert!(harness.dialogs.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn scanned_totp_key() {
        let harness = Harness::new();
        let mut session = harness.open().await;

        assert!(!session.apply_scanned_totp(Some("  ")).unwrap());
        assert!(!session.apply_scanned_totp(None).unwrap());
        assert_eq!(session.form().unwrap().totp, "");
        assert_eq!(harness.dialogs.alerts().len(), 2);

        assert!(session.apply_scanned_totp(Some("JBSWY3DPEHPK3PXP")).unwrap());
        assert_eq!(session.form().unwrap().totp, "JBSWY3DPEHPK3PXP");
        assert_eq!(
            harness.dialogs.toasts(),
            vec![messages::AUTHENTICATOR_KEY_ADDED.to_string()]
        );
    }

    #[tokio::test]
    async fn close_discards_form_and_blocks_triggers() {
        let harness = Harness::new();
        let mut session = harness.open().await;

        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.form().is_none());
        assert!(session.form_mut().is_err());
        assert_eq!(session.save().await.unwrap(), ActionOutcome::Ignored);
        assert_eq!(harness.updates(), 0);
    }
}
