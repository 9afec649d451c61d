//! Reconciliation engine: converges the remote store to the documents.
//!
//! A run has two phases. `converge` creates or updates one note per block and
//! writes new origin-ids back into the documents. `prune` then re-extracts the
//! documents from scratch, so the ids written in phase one are visible, and
//! deletes every owned note no block refers to anymore.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::block::{new_origin_id, Block};
use crate::documents::{is_path_child_of, DocumentStore};
use crate::error::{DocumentError, Result, SyncError};
use crate::identity::{Identity, OwnedNotes};
use crate::parser::{extract_blocks, DocumentContext};
use crate::remote::{NoteModel, RemoteStore};
use crate::types::Settings;
use crate::writeback::write_origin_id;

/// Per-category operation counts of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed_created: usize,
    pub failed_updated: usize,
    pub failed_deleted: usize,
    /// Orphans found but left in place because deletion is disabled.
    pub orphans_kept: usize,
    /// Blocks dropped because an earlier block carries the same origin-id.
    pub duplicates_skipped: usize,
}

impl SyncStats {
    pub fn failures(&self) -> usize {
        self.failed_created + self.failed_updated + self.failed_deleted
    }
}

/// Outcome of the optional AnkiWeb sync after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemoteSyncOutcome {
    Skipped,
    Completed,
    Failed { error: String },
}

/// Result of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub vault: String,
    pub stats: SyncStats,
    pub remote_sync: RemoteSyncOutcome,
}

impl SyncReport {
    /// User-facing summary text.
    pub fn summary(&self) -> String {
        let stats = &self.stats;
        let mut summary = format!(
            "Sync Completed! \nCreated Blocks: {} Updated Blocks: {} Deleted Blocks: {}\n",
            stats.created, stats.updated, stats.deleted
        );
        if stats.failed_created > 0 {
            summary.push_str(&format!("Failed Created Blocks: {}\n", stats.failed_created));
        }
        if stats.failed_updated > 0 {
            summary.push_str(&format!("Failed Updated Blocks: {}\n", stats.failed_updated));
        }
        if stats.failed_deleted > 0 {
            summary.push_str(&format!("Failed Deleted Blocks: {}\n", stats.failed_deleted));
        }
        if stats.orphans_kept > 0 {
            summary.push_str(&format!("Kept Orphaned Notes: {}\n", stats.orphans_kept));
        }
        if stats.duplicates_skipped > 0 {
            summary.push_str(&format!(
                "Skipped Duplicate Blocks: {} (remove the copied oid marker)\n",
                stats.duplicates_skipped
            ));
        }
        if stats.failures() > 0 {
            summary.push_str("Failed blocks are retried on the next sync.");
        } else if let RemoteSyncOutcome::Failed { .. } = self.remote_sync {
            summary.push_str("Failed to synchronize AnkiWeb");
        }
        summary.trim_end().to_string()
    }
}

/// Drives one full sync pass.
pub struct Reconciler<'a, D, R> {
    documents: &'a D,
    remote: &'a R,
    settings: &'a Settings,
}

impl<'a, D: DocumentStore, R: RemoteStore> Reconciler<'a, D, R> {
    pub fn new(documents: &'a D, remote: &'a R, settings: &'a Settings) -> Self {
        Self {
            documents,
            remote,
            settings,
        }
    }

    /// Run a full sync and report what was done.
    pub async fn run(&self) -> Result<SyncReport> {
        let vault = self.documents.vault_name();
        let vault_tag = self.settings.vault_tag(&vault);
        info!(vault = %vault, tag = %vault_tag, "Starting sync");

        self.remote
            .request_permission()
            .await
            .map_err(SyncError::Permission)?;

        if self.settings.backup {
            if let Err(e) = self.remote.create_backup().await {
                warn!(error = %e, "Backup failed, continuing without it");
            }
        }

        self.remote
            .create_model(&NoteModel::standard())
            .await
            .map_err(SyncError::ModelCreation)?;

        let mut stats = SyncStats::default();

        let (blocks, duplicates) = self.extract_unique().await?;
        stats.duplicates_skipped = duplicates;
        info!(count = blocks.len(), "Recognized blocks");
        self.converge(blocks, &vault_tag, &mut stats).await?;

        self.prune(&vault_tag, &mut stats).await?;

        self.housekeeping().await;

        let remote_sync = if stats.failures() == 0 && self.settings.sync_anki_web {
            match self.remote.sync_remote().await {
                Ok(()) => RemoteSyncOutcome::Completed,
                Err(e) => {
                    warn!(error = %e, "AnkiWeb sync failed");
                    RemoteSyncOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            }
        } else {
            RemoteSyncOutcome::Skipped
        };

        let report = SyncReport {
            vault,
            stats,
            remote_sync,
        };
        info!(?report.stats, "{}", report.summary());
        Ok(report)
    }

    /// Extract every block from every eligible document.
    ///
    /// Only the first block carrying a given origin-id is kept.
    pub async fn extract_all(&self) -> std::result::Result<Vec<Block>, DocumentError> {
        self.extract_unique().await.map(|(blocks, _)| blocks)
    }

    /// Like `extract_all`, also returning how many duplicates were dropped.
    async fn extract_unique(&self) -> std::result::Result<(Vec<Block>, usize), DocumentError> {
        let options = self.settings.extract_options();
        let mut documents = self.documents.list_documents().await?;
        documents.sort();

        let mut blocks = Vec::new();
        for doc in documents
            .iter()
            .filter(|d| !is_path_child_of(&d.path, &self.settings.template_folder))
        {
            let content = self.documents.read(doc).await?;
            let meta = self.documents.metadata(doc).await?;
            let ctx = DocumentContext {
                path: &doc.path,
                meta: &meta,
                options: &options,
            };
            blocks.extend(extract_blocks(&content, &ctx));
        }

        let extracted = blocks.len();
        let mut seen = HashSet::new();
        blocks.retain(|block| match block.origin_id() {
            Some(origin_id) if !seen.insert(origin_id.to_string()) => {
                warn!(
                    origin_id,
                    path = %block.location().path,
                    line = block.location().line,
                    "Duplicate origin-id, block skipped"
                );
                false
            }
            _ => true,
        });

        debug!(?blocks, "Extracted blocks");
        let duplicates = extracted - blocks.len();
        Ok((blocks, duplicates))
    }

    /// Phase one: create or update a note for every block.
    async fn converge(&self, blocks: Vec<Block>, vault_tag: &str, stats: &mut SyncStats) -> Result<()> {
        let owned = OwnedNotes::fetch(self.remote, vault_tag).await?;

        for block in blocks {
            self.reconcile_block(block, &owned, vault_tag, stats).await;
        }
        Ok(())
    }

    async fn reconcile_block(
        &self,
        mut block: Block,
        owned: &OwnedNotes,
        vault_tag: &str,
        stats: &mut SyncStats,
    ) {
        let identity = match block.identity(self.remote, owned).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, path = %block.location().path, "Could not resolve note id");
                stats.failed_updated += 1;
                return;
            }
        };

        match identity {
            Identity::Unsynced => {
                let origin_id = new_origin_id();
                block.assign_origin_id(origin_id.clone());

                if let Err(e) = self.remote.add_note(&block.new_note(vault_tag)).await {
                    warn!(error = %e, path = %block.location().path, "Failed to add note");
                    stats.failed_created += 1;
                    return;
                }
                match write_origin_id(self.documents, block.location(), &origin_id).await {
                    Ok(()) => {
                        info!(origin_id = %origin_id, "Added note with new origin-id");
                        stats.created += 1;
                    }
                    Err(e) => {
                        warn!(error = %e, origin_id = %origin_id, "Note added but origin-id could not be written back");
                        stats.failed_created += 1;
                    }
                }
            }
            Identity::Detached { origin_id } => {
                match self.remote.add_note(&block.new_note(vault_tag)).await {
                    Ok(remote_id) => {
                        info!(origin_id = %origin_id, remote_id, "Re-added note whose remote copy was missing");
                        stats.created += 1;
                    }
                    Err(e) => {
                        warn!(error = %e, origin_id = %origin_id, "Failed to re-add note");
                        stats.failed_created += 1;
                    }
                }
            }
            Identity::Linked {
                origin_id,
                remote_id,
            } => match self
                .remote
                .update_note_fields(remote_id, &block.note_fields())
                .await
            {
                Ok(()) => {
                    info!(origin_id = %origin_id, remote_id, "Updated note");
                    stats.updated += 1;
                }
                Err(e) => {
                    warn!(error = %e, origin_id = %origin_id, remote_id, "Failed to update note");
                    stats.failed_updated += 1;
                }
            },
        }
    }

    /// Phase two: delete owned notes no current block refers to.
    async fn prune(&self, vault_tag: &str, stats: &mut SyncStats) -> Result<()> {
        self.invoke_logged("reloadCollection").await;

        let blocks = self.extract_all().await?;
        let owned = OwnedNotes::fetch(self.remote, vault_tag).await?;

        let mut referenced = HashSet::new();
        for block in &blocks {
            if let Some(remote_id) = block.remote_id(self.remote, &owned).await? {
                referenced.insert(remote_id);
            }
        }
        info!(owned = owned.len(), referenced = referenced.len(), "Collected note references");

        let orphans: Vec<i64> = owned.iter().filter(|id| !referenced.contains(id)).collect();
        if orphans.is_empty() {
            return Ok(());
        }

        if !self.settings.delete_orphans {
            info!(?orphans, "Orphan deletion disabled, keeping notes");
            stats.orphans_kept = orphans.len();
            return Ok(());
        }

        for remote_id in orphans {
            match self.remote.delete_note(remote_id).await {
                Ok(()) => {
                    info!(remote_id, "Deleted orphaned note");
                    stats.deleted += 1;
                }
                Err(e) => {
                    warn!(error = %e, remote_id, "Failed to delete note");
                    stats.failed_deleted += 1;
                }
            }
        }
        Ok(())
    }

    async fn housekeeping(&self) {
        self.invoke_logged("removeEmptyNotes").await;
        self.invoke_logged("reloadCollection").await;
    }

    async fn invoke_logged(&self, action: &str) {
        if let Err(e) = self.remote.invoke(action, json!({})).await {
            warn!(error = %e, action, "Housekeeping action failed");
        }
    }
}
