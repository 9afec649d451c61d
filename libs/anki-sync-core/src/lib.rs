//! Core of the vault-to-Anki card sync.
//!
//! Provides:
//! - Block extractors for Markdown (verbatim-replace, question/answer, cloze)
//! - Block identity resolution and origin-id write-back
//! - The reconciliation engine and the single-run coordinator
//! - Contracts for the document store and the remote flashcard store

pub mod block;
pub mod coordinator;
pub mod documents;
pub mod error;
pub mod identity;
pub mod parser;
pub mod reconcile;
pub mod remote;
pub mod templates;
pub mod types;
pub mod writeback;

pub use block::{new_origin_id, Block};
pub use coordinator::{RunGuard, SyncCoordinator, SyncOutcome, SyncStatus};
pub use documents::{is_path_child_of, DocumentStore};
pub use error::{DocumentError, RemoteError, Result, SyncError};
pub use identity::{Identity, OwnedNotes};
pub use parser::{extract_blocks, DocumentContext, Extractor};
pub use reconcile::{Reconciler, RemoteSyncOutcome, SyncReport, SyncStats};
pub use remote::{NewNote, NoteFields, NoteModel, RemoteStore};
pub use types::{
    BlockKind, CardFields, DocumentMeta, DocumentRef, ExtractOptions, Settings, SourceLocation,
};
