//! Identity resolution: document-side origin-id to remote-side note id.

use std::collections::BTreeSet;

use crate::block::Block;
use crate::error::RemoteError;
use crate::remote::{origin_id_query, owned_notes_query, RemoteStore};

/// Ids of every note owned by this integration for one vault.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedNotes(BTreeSet<i64>);

impl OwnedNotes {
    /// Fetch the current listing from the remote store.
    pub async fn fetch<R: RemoteStore>(remote: &R, vault_tag: &str) -> Result<Self, RemoteError> {
        let ids = remote.query(&owned_notes_query(vault_tag)).await?;
        Ok(Self(ids.into_iter().collect()))
    }

    pub fn contains(&self, id: i64) -> bool {
        self.0.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<i64> for OwnedNotes {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// How a block relates to the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// No origin-id in the document yet.
    Unsynced,
    /// Origin-id present but no owned note carries it.
    Detached { origin_id: String },
    /// Origin-id present and confirmed in the owned listing.
    Linked { origin_id: String, remote_id: i64 },
}

impl Block {
    /// Remote note carrying this block's origin-id.
    ///
    /// A hit outside `owned` is ignored, so a stale id resolves to `None`.
    pub async fn remote_id<R: RemoteStore>(
        &self,
        remote: &R,
        owned: &OwnedNotes,
    ) -> Result<Option<i64>, RemoteError> {
        let Some(origin_id) = self.origin_id() else {
            return Ok(None);
        };
        let hits = remote.query(&origin_id_query(origin_id)).await?;
        Ok(hits.into_iter().find(|id| owned.contains(*id)))
    }

    /// Classify the block for the reconciliation policy.
    pub async fn identity<R: RemoteStore>(
        &self,
        remote: &R,
        owned: &OwnedNotes,
    ) -> Result<Identity, RemoteError> {
        let Some(origin_id) = self.origin_id().map(str::to_string) else {
            return Ok(Identity::Unsynced);
        };
        Ok(match self.remote_id(remote, owned).await? {
            Some(remote_id) => Identity::Linked {
                origin_id,
                remote_id,
            },
            None => Identity::Detached { origin_id },
        })
    }
}
