//! The extracted card unit and what it sends to the remote store.

use uuid::Uuid;

use crate::remote::{NewNote, NoteFields, APP_TAG, FIELD_NAMES, MODEL_NAME, OID_FIELD};
use crate::types::{BlockKind, CardFields, SourceLocation};

/// One card-worth of content found in a document.
///
/// Blocks are rebuilt from the documents on every run and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    kind: BlockKind,
    origin_id: Option<String>,
    fields: CardFields,
    location: SourceLocation,
    deck: String,
    tags: Vec<String>,
}

impl Block {
    pub fn new(
        kind: BlockKind,
        origin_id: Option<String>,
        fields: CardFields,
        location: SourceLocation,
        deck: String,
        tags: Vec<String>,
    ) -> Self {
        Self {
            kind,
            origin_id: origin_id.filter(|id| !id.trim().is_empty()),
            fields,
            location,
            deck,
            tags,
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    /// Identifier embedded in the document, `None` when never synced.
    pub fn origin_id(&self) -> Option<&str> {
        self.origin_id.as_deref()
    }

    pub fn fields(&self) -> &CardFields {
        &self.fields
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn deck(&self) -> &str {
        &self.deck
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Attach a newly generated origin-id before the block is created remotely.
    pub fn assign_origin_id(&mut self, origin_id: String) {
        self.origin_id = Some(origin_id);
    }

    /// All model fields, the `oid` field included.
    pub fn note_fields(&self) -> NoteFields {
        let values = [
            self.origin_id.clone().unwrap_or_default(),
            self.fields.text.clone(),
            self.fields.extra.clone(),
            self.fields.breadcrumb.clone(),
            self.fields.config.clone(),
            String::new(),
            String::new(),
        ];
        FIELD_NAMES
            .iter()
            .map(|name| name.to_string())
            .zip(values)
            .collect()
    }

    /// Note to add for this block, tagged as owned by `vault_tag`.
    pub fn new_note(&self, vault_tag: &str) -> NewNote {
        let mut tags = vec![vault_tag.to_string(), APP_TAG.to_string()];
        for tag in &self.tags {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }

        NewNote {
            deck: self.deck.clone(),
            model: MODEL_NAME.to_string(),
            fields: self.note_fields(),
            tags,
        }
    }
}

/// Fresh origin-id for a block synced for the first time.
pub fn new_origin_id() -> String {
    Uuid::new_v4().to_string()
}

/// Origin-id stored in a remote note's fields.
pub fn origin_id_of(fields: &NoteFields) -> Option<&str> {
    fields
        .get(OID_FIELD)
        .map(String::as_str)
        .filter(|id| !id.is_empty())
}
