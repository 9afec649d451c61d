//! Filesystem vault: a directory tree of Markdown documents.

use std::path::{Path, PathBuf};

use tracing::debug;

use anki_sync_core::{DocumentError, DocumentRef, DocumentStore};

#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, doc: &DocumentRef) -> PathBuf {
        doc.path
            .split('/')
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> DocumentError {
    if e.kind() == std::io::ErrorKind::NotFound {
        DocumentError::NotFound(path.display().to_string())
    } else {
        DocumentError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

impl DocumentStore for FsVault {
    fn vault_name(&self) -> String {
        self.root
            .canonicalize()
            .unwrap_or_else(|_| self.root.clone())
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "vault".to_string())
    }

    /// Every `.md` file below the root, hidden directories excluded.
    async fn list_documents(&self) -> Result<Vec<DocumentRef>, DocumentError> {
        let mut documents = Vec::new();
        let mut pending: Vec<(PathBuf, String)> = vec![(self.root.clone(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| io_error(&dir, e))?;

            while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
                let name = entry.file_name().to_string_lossy().into_owned();
                if is_hidden(&name) {
                    continue;
                }
                let relative = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{}/{}", prefix, name)
                };

                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| io_error(&entry.path(), e))?;
                if file_type.is_dir() {
                    pending.push((entry.path(), relative));
                } else if file_type.is_file() && name.ends_with(".md") {
                    documents.push(DocumentRef::new(relative));
                }
            }
        }

        documents.sort();
        debug!(count = documents.len(), root = %self.root.display(), "Listed documents");
        Ok(documents)
    }

    async fn read(&self, doc: &DocumentRef) -> Result<String, DocumentError> {
        let path = self.full_path(doc);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| io_error(&path, e))
    }

    async fn write(&self, doc: &DocumentRef, content: &str) -> Result<(), DocumentError> {
        let path = self.full_path(doc);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| io_error(&path, e))
    }
}
