//! AnkiConnect HTTP client.
//!
//! Every action is one POST of `{action, version, params}`; the add-on answers
//! `{result, error}` with exactly one of the two set.

use std::path::PathBuf;

use chrono::Local;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use anki_sync_core::{NewNote, NoteFields, NoteModel, RemoteError, RemoteStore};

const API_VERSION: u8 = 6;

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    action: &'a str,
    version: u8,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PermissionResponse {
    permission: String,
}

/// Where and what to export before a run modifies the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupTarget {
    pub dir: PathBuf,
    pub deck: String,
}

/// Client for a running AnkiConnect add-on.
#[derive(Debug, Clone)]
pub struct AnkiConnectClient {
    client: Client,
    url: String,
    backup: BackupTarget,
}

impl AnkiConnectClient {
    pub fn new(url: &str, backup: BackupTarget) -> Self {
        Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            backup,
        }
    }

    /// AnkiConnect API version; doubles as a reachability probe.
    pub async fn version(&self) -> Result<u32, RemoteError> {
        self.call("version", json!({})).await
    }

    async fn call<T: DeserializeOwned>(&self, action: &str, params: Value) -> Result<T, RemoteError> {
        let request = ApiRequest {
            action,
            version: API_VERSION,
            params,
        };
        debug!(action, "AnkiConnect request");

        let resp = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(RemoteError::Transport(format!(
                "AnkiConnect answered HTTP {}",
                resp.status().as_u16()
            )));
        }

        let response: ApiResponse = resp.json().await.map_err(|e| RemoteError::Decode {
            action: action.to_string(),
            message: e.to_string(),
        })?;

        if let Some(message) = response.error {
            return Err(RemoteError::Api {
                action: action.to_string(),
                message,
            });
        }

        serde_json::from_value(response.result).map_err(|e| RemoteError::Decode {
            action: action.to_string(),
            message: e.to_string(),
        })
    }
}

impl RemoteStore for AnkiConnectClient {
    async fn request_permission(&self) -> Result<(), RemoteError> {
        let response: PermissionResponse = self.call("requestPermission", json!({})).await?;
        if response.permission == "granted" {
            Ok(())
        } else {
            Err(RemoteError::PermissionDenied)
        }
    }

    async fn create_backup(&self) -> Result<(), RemoteError> {
        tokio::fs::create_dir_all(&self.backup.dir)
            .await
            .map_err(|e| RemoteError::Api {
                action: "exportPackage".to_string(),
                message: format!("cannot create {}: {}", self.backup.dir.display(), e),
            })?;

        let file = format!("anki-backup-{}.apkg", Local::now().format("%Y%m%d-%H%M%S"));
        let path = self.backup.dir.join(file);
        let exported: bool = self
            .call(
                "exportPackage",
                json!({
                    "deck": self.backup.deck,
                    "path": path.to_string_lossy(),
                    "includeSched": true,
                }),
            )
            .await?;

        if !exported {
            return Err(RemoteError::Api {
                action: "exportPackage".to_string(),
                message: format!("deck {} was not exported", self.backup.deck),
            });
        }
        info!(path = %path.display(), "Created backup");
        Ok(())
    }

    async fn create_model(&self, model: &NoteModel) -> Result<(), RemoteError> {
        let existing: Vec<String> = self.call("modelNames", json!({})).await?;
        if existing.iter().any(|name| *name == model.name) {
            debug!(model = %model.name, "Note model already exists");
            return Ok(());
        }

        let _: Value = self
            .call(
                "createModel",
                json!({
                    "modelName": model.name,
                    "inOrderFields": model.fields,
                    "css": model.css,
                    "isCloze": false,
                    "cardTemplates": [{
                        "Name": "Card 1",
                        "Front": model.front_template,
                        "Back": model.back_template,
                    }],
                }),
            )
            .await?;
        info!(model = %model.name, "Created note model");
        Ok(())
    }

    async fn invoke(&self, action: &str, params: Value) -> Result<Value, RemoteError> {
        self.call(action, params).await
    }

    async fn query(&self, search: &str) -> Result<Vec<i64>, RemoteError> {
        self.call("findNotes", json!({ "query": search })).await
    }

    async fn add_note(&self, note: &NewNote) -> Result<i64, RemoteError> {
        let _: Value = self.call("createDeck", json!({ "deck": note.deck })).await?;

        let id: Option<i64> = self
            .call(
                "addNote",
                json!({
                    "note": {
                        "deckName": note.deck,
                        "modelName": note.model,
                        "fields": note.fields,
                        "tags": note.tags,
                        "options": { "allowDuplicate": true },
                    }
                }),
            )
            .await?;

        id.ok_or_else(|| RemoteError::Api {
            action: "addNote".to_string(),
            message: "note was not created".to_string(),
        })
    }

    async fn update_note_fields(&self, id: i64, fields: &NoteFields) -> Result<(), RemoteError> {
        let _: Value = self
            .call(
                "updateNoteFields",
                json!({ "note": { "id": id, "fields": fields } }),
            )
            .await?;
        Ok(())
    }

    async fn delete_note(&self, id: i64) -> Result<(), RemoteError> {
        let _: Value = self.call("deleteNotes", json!({ "notes": [id] })).await?;
        Ok(())
    }

    async fn sync_remote(&self) -> Result<(), RemoteError> {
        let _: Value = self.call("sync", json!({})).await?;
        Ok(())
    }
}
