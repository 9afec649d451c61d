//! Remote store gateway contract and the search expressions the engine uses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RemoteError;

/// Note type every synced note is created with.
pub const MODEL_NAME: &str = "ObsidianAnkiSyncModel";

/// Tag marking notes created by this integration.
pub const APP_TAG: &str = "ObsidianAnkiSync";

/// Field holding the block's origin-id.
pub const OID_FIELD: &str = "oid";

/// Fields of [`MODEL_NAME`], in order.
pub const FIELD_NAMES: [&str; 7] = [
    OID_FIELD,
    "Text",
    "Extra",
    "Breadcrumb",
    "Config",
    "Tobedefinedlater",
    "Tobedefinedlater2",
];

/// Field name -> value.
pub type NoteFields = BTreeMap<String, String>;

/// Note type definition created on first sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteModel {
    pub name: String,
    pub fields: Vec<String>,
    pub front_template: String,
    pub back_template: String,
    pub css: String,
}

/// A note to be added to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub deck: String,
    pub model: String,
    pub fields: NoteFields,
    pub tags: Vec<String>,
}

/// Request/response client to the external flashcard store.
///
/// Calls are awaited one at a time by the engine; implementations need no
/// internal locking for ordering.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Ask the store for access. Denial is fatal to a run.
    async fn request_permission(&self) -> Result<(), RemoteError>;

    /// Snapshot the collection before it is modified.
    async fn create_backup(&self) -> Result<(), RemoteError>;

    /// Create the note type unless it already exists.
    async fn create_model(&self, model: &NoteModel) -> Result<(), RemoteError>;

    /// Generic passthrough for actions without a dedicated method.
    async fn invoke(&self, action: &str, params: Value) -> Result<Value, RemoteError>;

    /// Ids of the notes matching a search expression.
    async fn query(&self, search: &str) -> Result<Vec<i64>, RemoteError>;

    /// Add a note and return its id.
    async fn add_note(&self, note: &NewNote) -> Result<i64, RemoteError>;

    /// Replace the fields of an existing note.
    async fn update_note_fields(&self, id: i64, fields: &NoteFields) -> Result<(), RemoteError>;

    async fn delete_note(&self, id: i64) -> Result<(), RemoteError>;

    /// Trigger the store's own full sync (AnkiWeb).
    async fn sync_remote(&self) -> Result<(), RemoteError>;
}

/// Replace every whitespace character with `_`, since tags cannot hold spaces.
pub fn tag_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Search matching every note owned by this integration for one vault.
pub fn owned_notes_query(vault_tag: &str) -> String {
    format!("tag:{} note:{} tag:{}", vault_tag, MODEL_NAME, APP_TAG)
}

/// Search matching the note carrying a given origin-id.
pub fn origin_id_query(origin_id: &str) -> String {
    format!("note:{} \"{}:{}\"", MODEL_NAME, OID_FIELD, origin_id)
}
