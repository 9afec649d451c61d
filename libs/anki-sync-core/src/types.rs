//! Core types shared by the extractors, the engine and the agent.

use serde::{Deserialize, Serialize};

/// Syntax a block was recognised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Replace,
    Basic,
    Cloze,
}

impl BlockKind {
    /// Get the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Basic => "basic",
            Self::Cloze => "cloze",
        }
    }
}

/// Where a block starts inside its document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Vault-relative document path.
    pub path: String,
    /// 1-indexed line of the block's first line.
    pub line: usize,
    /// Text of the block's first line, used to find it again after edits.
    pub anchor: String,
}

/// Content destined for the remote record's fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFields {
    pub text: String,
    pub extra: String,
    pub breadcrumb: String,
    pub config: String,
}

/// A document known to the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Vault-relative path with `/` separators.
    pub path: String,
}

impl DocumentRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Read-only metadata index of a document (from its frontmatter).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck: Option<String>,
    pub tags: Vec<String>,
}

/// Persisted sync settings.
///
/// Key names match the settings file written by earlier releases, so existing
/// files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Export the collection before syncing.
    pub backup: bool,
    /// Fill the Breadcrumb field with the document path and headings.
    pub breadcrumb: bool,
    /// Documents under this folder are never scanned.
    #[serde(rename = "templatefolder")]
    pub template_folder: String,
    /// Trigger an AnkiWeb sync after a run without failures.
    #[serde(rename = "syncAnkiWeb")]
    pub sync_anki_web: bool,
    /// Delete owned notes that no longer have a block. When false they are
    /// only reported.
    #[serde(rename = "deleteOrphans")]
    pub delete_orphans: bool,
    /// Pins the vault tag instead of deriving it from the vault name.
    #[serde(rename = "vaultTag", skip_serializing_if = "Option::is_none")]
    pub vault_tag: Option<String>,
    /// Deck used when a document does not name one.
    #[serde(rename = "defaultDeck")]
    pub default_deck: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backup: false,
            breadcrumb: true,
            template_folder: String::new(),
            sync_anki_web: false,
            delete_orphans: true,
            vault_tag: None,
            default_deck: "Default".to_string(),
        }
    }
}

impl Settings {
    /// Options handed to every extractor for one run.
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            breadcrumb: self.breadcrumb,
            default_deck: self.default_deck.clone(),
        }
    }

    /// Tag identifying notes that belong to this vault.
    pub fn vault_tag(&self, vault_name: &str) -> String {
        match self.vault_tag.as_deref().map(str::trim) {
            Some(tag) if !tag.is_empty() => crate::remote::tag_safe(tag),
            _ => crate::remote::tag_safe(vault_name),
        }
    }
}

/// Configuration passed explicitly into the extractors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    pub breadcrumb: bool,
    pub default_deck: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Settings::default().extract_options()
    }
}
