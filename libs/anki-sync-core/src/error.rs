//! Error types for anki-sync-core.

use thiserror::Error;

/// Result type alias using SyncError.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Failures reported by the remote flashcard store.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("{action} failed: {message}")]
    Api { action: String, message: String },

    #[error("permission to access the collection was denied")]
    PermissionDenied,

    #[error("unexpected response to {action}: {message}")]
    Decode { action: String, message: String },
}

/// Failures reported by the document store.
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    #[error("io error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("block anchor not found in {path} near line {line}")]
    AnchorNotFound { path: String, line: usize },
}

/// Errors that abort a whole sync run.
///
/// Per-item failures never become a `SyncError`; they are counted in
/// [`crate::reconcile::SyncStats`] instead.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("could not get access to Anki: {0}")]
    Permission(RemoteError),

    #[error("could not create note model: {0}")]
    ModelCreation(RemoteError),

    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),

    #[error("document store error: {0}")]
    Document(#[from] DocumentError),
}

impl SyncError {
    /// Best-effort remediation hint shown next to the raw error.
    pub fn hint(&self) -> &'static str {
        match self {
            SyncError::Permission(RemoteError::PermissionDenied) => {
                "Accept the permission prompt in Anki, or add this client to AnkiConnect's webCorsOriginList."
            }
            SyncError::Permission(RemoteError::Transport(_))
            | SyncError::Remote(RemoteError::Transport(_)) => {
                "Make sure Anki is running and the AnkiConnect add-on is installed and enabled."
            }
            SyncError::ModelCreation(_) => {
                "A note type with a conflicting definition may exist. Check Tools > Manage Note Types in Anki."
            }
            SyncError::Permission(_) | SyncError::Remote(_) => {
                "Update AnkiConnect to the latest version and restart Anki."
            }
            SyncError::Document(DocumentError::AnchorNotFound { .. }) => {
                "A document changed while syncing. Run the sync again."
            }
            SyncError::Document(_) => {
                "Check that the vault folder exists and is readable and writable."
            }
        }
    }
}
