//! In-memory collaborators for engine tests.
//!
//! `MemoryVault` stands in for the document store and `MemoryAnki` for the
//! remote flashcard store. Both keep their state behind a `Mutex` so tests can
//! inspect it after a run, and both accept injected failures.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::{json, Value};

use anki_sync_core::remote::{origin_id_query, APP_TAG, MODEL_NAME, OID_FIELD};
use anki_sync_core::{
    DocumentError, DocumentRef, DocumentStore, NewNote, NoteFields, NoteModel, RemoteError,
    RemoteStore,
};

pub const VAULT: &str = "Test Vault";
pub const VAULT_TAG: &str = "Test_Vault";

/// Document store backed by a path -> content map.
#[derive(Debug)]
pub struct MemoryVault {
    name: String,
    docs: Mutex<BTreeMap<String, String>>,
    fail_writes: Mutex<bool>,
    fail_listing: Mutex<bool>,
}

impl MemoryVault {
    pub fn new<'a>(docs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            name: VAULT.to_string(),
            docs: Mutex::new(
                docs.into_iter()
                    .map(|(path, content)| (path.to_string(), content.to_string()))
                    .collect(),
            ),
            fail_writes: Mutex::new(false),
            fail_listing: Mutex::new(false),
        }
    }

    pub fn content(&self, path: &str) -> String {
        self.docs.lock().unwrap().get(path).cloned().unwrap_or_default()
    }

    pub fn set_content(&self, path: &str, content: &str) {
        self.docs
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
    }

    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    pub fn fail_listing(&self, fail: bool) {
        *self.fail_listing.lock().unwrap() = fail;
    }
}

impl DocumentStore for MemoryVault {
    fn vault_name(&self) -> String {
        self.name.clone()
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRef>, DocumentError> {
        if *self.fail_listing.lock().unwrap() {
            return Err(DocumentError::Io {
                path: "/".to_string(),
                message: "listing failed".to_string(),
            });
        }
        Ok(self.docs.lock().unwrap().keys().map(DocumentRef::new).collect())
    }

    async fn read(&self, doc: &DocumentRef) -> Result<String, DocumentError> {
        self.docs
            .lock()
            .unwrap()
            .get(&doc.path)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(doc.path.clone()))
    }

    async fn write(&self, doc: &DocumentRef, content: &str) -> Result<(), DocumentError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(DocumentError::Io {
                path: doc.path.clone(),
                message: "read-only".to_string(),
            });
        }
        self.set_content(&doc.path, content);
        Ok(())
    }
}

/// A note as held by the fake remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNote {
    pub deck: String,
    pub model: String,
    pub fields: NoteFields,
    pub tags: Vec<String>,
}

impl StoredNote {
    pub fn origin_id(&self) -> &str {
        self.fields.get(OID_FIELD).map(String::as_str).unwrap_or_default()
    }

    pub fn text(&self) -> &str {
        self.fields.get("Text").map(String::as_str).unwrap_or_default()
    }

    fn matches(&self, search: &str) -> bool {
        search.split_whitespace().all(|term| {
            let term = term.trim_matches('"');
            match term.split_once(':') {
                Some(("tag", tag)) => self.tags.iter().any(|t| t == tag),
                Some(("note", model)) => self.model == model,
                Some((field, value)) => self.fields.get(field).map(String::as_str) == Some(value),
                None => false,
            }
        })
    }
}

/// Failures to inject into `MemoryAnki`.
#[derive(Debug, Clone, Default)]
pub struct Failures {
    pub deny_permission: bool,
    pub unreachable: bool,
    pub backup: bool,
    pub model: bool,
    /// Fail `add_note` for notes whose Text contains this string.
    pub add_containing: Option<String>,
    pub update: bool,
    pub delete: bool,
    pub query: bool,
    pub sync: bool,
    pub housekeeping: bool,
}

#[derive(Debug, Default)]
struct AnkiState {
    notes: BTreeMap<i64, StoredNote>,
    next_id: i64,
    models: Vec<String>,
    calls: Vec<String>,
    failures: Failures,
}

/// Remote store holding notes in memory and recording every call.
#[derive(Debug, Default)]
pub struct MemoryAnki {
    state: Mutex<AnkiState>,
}

impl MemoryAnki {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AnkiState {
                next_id: 1_000,
                ..AnkiState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, AnkiState> {
        self.state.lock().unwrap()
    }

    pub fn set_failures(&self, failures: Failures) {
        self.state().failures = failures;
    }

    pub fn notes(&self) -> BTreeMap<i64, StoredNote> {
        self.state().notes.clone()
    }

    pub fn note_by_origin_id(&self, origin_id: &str) -> Option<(i64, StoredNote)> {
        self.state()
            .notes
            .iter()
            .find(|(_, note)| note.origin_id() == origin_id)
            .map(|(id, note)| (*id, note.clone()))
    }

    /// Insert a note as if created by an earlier run.
    pub fn seed(&self, origin_id: &str, text: &str) -> i64 {
        let mut fields = NoteFields::new();
        fields.insert(OID_FIELD.to_string(), origin_id.to_string());
        fields.insert("Text".to_string(), text.to_string());
        self.insert(StoredNote {
            deck: "Default".to_string(),
            model: MODEL_NAME.to_string(),
            fields,
            tags: vec![VAULT_TAG.to_string(), APP_TAG.to_string()],
        })
    }

    /// Delete a note behind the engine's back, as a user would in Anki.
    pub fn remove(&self, id: i64) {
        self.state().notes.remove(&id);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn count_calls(&self, action: &str) -> usize {
        self.state().calls.iter().filter(|c| *c == action).count()
    }

    pub fn reset_calls(&self) {
        self.state().calls.clear();
    }

    fn insert(&self, note: StoredNote) -> i64 {
        let mut state = self.state();
        state.next_id += 1;
        let id = state.next_id;
        state.notes.insert(id, note);
        id
    }

    fn record(&self, action: &str) -> Failures {
        let mut state = self.state();
        state.calls.push(action.to_string());
        state.failures.clone()
    }
}

fn api_error(action: &str, message: &str) -> RemoteError {
    RemoteError::Api {
        action: action.to_string(),
        message: message.to_string(),
    }
}

impl RemoteStore for MemoryAnki {
    async fn request_permission(&self) -> Result<(), RemoteError> {
        let failures = self.record("requestPermission");
        // Suspend once so concurrent runs interleave.
        tokio::task::yield_now().await;
        if failures.unreachable {
            return Err(RemoteError::Transport("connection refused".to_string()));
        }
        if failures.deny_permission {
            return Err(RemoteError::PermissionDenied);
        }
        Ok(())
    }

    async fn create_backup(&self) -> Result<(), RemoteError> {
        if self.record("exportPackage").backup {
            return Err(api_error("exportPackage", "disk full"));
        }
        Ok(())
    }

    async fn create_model(&self, model: &NoteModel) -> Result<(), RemoteError> {
        if self.record("createModel").model {
            return Err(api_error("createModel", "Model name already exists"));
        }
        let mut state = self.state();
        if !state.models.contains(&model.name) {
            state.models.push(model.name.clone());
        }
        Ok(())
    }

    async fn invoke(&self, action: &str, _params: Value) -> Result<Value, RemoteError> {
        if self.record(action).housekeeping {
            return Err(api_error(action, "collection is not available"));
        }
        Ok(json!(null))
    }

    async fn query(&self, search: &str) -> Result<Vec<i64>, RemoteError> {
        if self.record("findNotes").query {
            return Err(RemoteError::Transport("connection reset".to_string()));
        }
        Ok(self
            .state()
            .notes
            .iter()
            .filter(|(_, note)| note.matches(search))
            .map(|(id, _)| *id)
            .collect())
    }

    async fn add_note(&self, note: &NewNote) -> Result<i64, RemoteError> {
        let failures = self.record("addNote");
        let text = note.fields.get("Text").cloned().unwrap_or_default();
        if let Some(needle) = failures.add_containing {
            if text.contains(&needle) {
                return Err(api_error("addNote", "cannot create note because it is empty"));
            }
        }
        Ok(self.insert(StoredNote {
            deck: note.deck.clone(),
            model: note.model.clone(),
            fields: note.fields.clone(),
            tags: note.tags.clone(),
        }))
    }

    async fn update_note_fields(&self, id: i64, fields: &NoteFields) -> Result<(), RemoteError> {
        if self.record("updateNoteFields").update {
            return Err(api_error("updateNoteFields", "note was not found"));
        }
        let mut state = self.state();
        let note = state
            .notes
            .get_mut(&id)
            .ok_or_else(|| api_error("updateNoteFields", "note was not found"))?;
        note.fields = fields.clone();
        Ok(())
    }

    async fn delete_note(&self, id: i64) -> Result<(), RemoteError> {
        if self.record("deleteNotes").delete {
            return Err(api_error("deleteNotes", "collection is locked"));
        }
        self.state().notes.remove(&id);
        Ok(())
    }

    async fn sync_remote(&self) -> Result<(), RemoteError> {
        if self.record("sync").sync {
            return Err(api_error("sync", "auth not configured"));
        }
        Ok(())
    }
}

/// Search the fake exactly as the engine would for one origin-id.
pub fn ids_for_origin_id(anki: &MemoryAnki, origin_id: &str) -> Vec<i64> {
    let search = origin_id_query(origin_id);
    anki.state()
        .notes
        .iter()
        .filter(|(_, note)| note.matches(&search))
        .map(|(id, _)| *id)
        .collect()
}

/// Origin-ids of every marker line in a document, in order.
pub fn markers(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(anki_sync_core::parser::parse_marker)
        .map(str::to_string)
        .collect()
}
