//! Document store contract.

use std::path::{Component, Path};

use crate::error::DocumentError;
use crate::parser::parse_frontmatter;
use crate::types::{DocumentMeta, DocumentRef};

/// The user's document collection.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Display name of the collection, used to derive the vault tag.
    fn vault_name(&self) -> String;

    /// Every Markdown document in the collection.
    async fn list_documents(&self) -> Result<Vec<DocumentRef>, DocumentError>;

    async fn read(&self, doc: &DocumentRef) -> Result<String, DocumentError>;

    /// Metadata index of a document. Defaults to its frontmatter.
    async fn metadata(&self, doc: &DocumentRef) -> Result<DocumentMeta, DocumentError> {
        Ok(parse_frontmatter(&self.read(doc).await?))
    }

    /// Replace a document's text.
    async fn write(&self, doc: &DocumentRef, content: &str) -> Result<(), DocumentError>;
}

/// Whether `path` lies strictly inside `parent`. An empty parent contains
/// nothing.
pub fn is_path_child_of(path: &str, parent: &str) -> bool {
    let parent: Vec<Component<'_>> = Path::new(parent.trim_matches('/'))
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if parent.is_empty() {
        return false;
    }

    let mut components = Path::new(path).components().filter(|c| !matches!(c, Component::CurDir));
    let inside = parent.iter().all(|p| components.next() == Some(*p));
    inside && components.next().is_some()
}
