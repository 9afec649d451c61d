//! Common test utilities for agent integration tests.
//!
//! This module provides:
//! - FakeAnkiConnect, an AnkiConnect stand-in served by axum on an ephemeral port
//! - Helpers for building the agent's client against it

#![allow(dead_code)]

pub mod fixtures;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};

use anki_vault_sync::anki_connect::{AnkiConnectClient, BackupTarget};

/// A note held by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeNote {
    pub deck: String,
    pub model: String,
    pub fields: BTreeMap<String, String>,
    pub tags: Vec<String>,
}

impl FakeNote {
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }

    fn matches(&self, query: &str) -> bool {
        query.split_whitespace().all(|term| {
            let term = term.trim_matches('"');
            match term.split_once(':') {
                Some(("tag", tag)) => self.tags.iter().any(|t| t == tag),
                Some(("note", model)) => self.model == model,
                Some((field, value)) => self.fields.get(field).map(String::as_str) == Some(value),
                None => false,
            }
        })
    }
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub permission: String,
    pub notes: BTreeMap<i64, FakeNote>,
    pub models: Vec<String>,
    pub decks: Vec<String>,
    pub requests: Vec<Value>,
    next_id: i64,
}

/// Running fake AnkiConnect server.
pub struct FakeAnkiConnect {
    pub url: String,
    state: Arc<Mutex<FakeState>>,
}

impl FakeAnkiConnect {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState {
            permission: "granted".to_string(),
            models: vec!["Basic".to_string()],
            decks: vec!["Default".to_string()],
            next_id: 1_700_000_000_000,
            ..FakeState::default()
        }));

        let app = Router::new()
            .route("/", post(handle))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake AnkiConnect");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Client pointed at this server, exporting backups into `backup_dir`.
    pub fn client(&self, backup_dir: &Path) -> AnkiConnectClient {
        AnkiConnectClient::new(
            &self.url,
            BackupTarget {
                dir: backup_dir.to_path_buf(),
                deck: "Default".to_string(),
            },
        )
    }

    /// Actions received so far, in order.
    pub fn actions(&self) -> Vec<String> {
        self.state()
            .requests
            .iter()
            .filter_map(|r| r["action"].as_str().map(str::to_string))
            .collect()
    }

    pub fn requests_for(&self, action: &str) -> Vec<Value> {
        self.state()
            .requests
            .iter()
            .filter(|r| r["action"] == action)
            .cloned()
            .collect()
    }

    pub fn notes(&self) -> BTreeMap<i64, FakeNote> {
        self.state().notes.clone()
    }

    pub fn note_by_origin_id(&self, origin_id: &str) -> Option<FakeNote> {
        self.state()
            .notes
            .values()
            .find(|n| n.field("oid") == origin_id)
            .cloned()
    }
}

fn ok(result: Value) -> Json<Value> {
    Json(json!({ "result": result, "error": null }))
}

fn err(message: &str) -> Json<Value> {
    Json(json!({ "result": null, "error": message }))
}

fn string_map(value: &Value) -> BTreeMap<String, String> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string()))
                .collect()
        })
        .unwrap_or_default()
}

async fn handle(State(state): State<Arc<Mutex<FakeState>>>, Json(body): Json<Value>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    state.requests.push(body.clone());

    if body["version"] != 6 {
        return err("unsupported version");
    }
    let params = &body["params"];

    match body["action"].as_str().unwrap_or_default() {
        "version" => ok(json!(6)),
        "requestPermission" => ok(json!({ "permission": state.permission, "version": 6 })),
        "modelNames" => ok(json!(state.models)),
        "createModel" => {
            let name = params["modelName"].as_str().unwrap_or_default().to_string();
            if state.models.contains(&name) {
                return err("Model name already exists");
            }
            state.models.push(name);
            ok(json!({}))
        }
        "createDeck" => {
            let deck = params["deck"].as_str().unwrap_or_default().to_string();
            if !state.decks.contains(&deck) {
                state.decks.push(deck);
            }
            ok(json!(1))
        }
        "addNote" => {
            let note = &params["note"];
            let deck = note["deckName"].as_str().unwrap_or_default().to_string();
            if !state.decks.contains(&deck) {
                return err("deck was not found");
            }
            state.next_id += 1;
            let id = state.next_id;
            state.notes.insert(
                id,
                FakeNote {
                    deck,
                    model: note["modelName"].as_str().unwrap_or_default().to_string(),
                    fields: string_map(&note["fields"]),
                    tags: note["tags"]
                        .as_array()
                        .map(|tags| {
                            tags.iter()
                                .filter_map(|t| t.as_str().map(str::to_string))
                                .collect()
                        })
                        .unwrap_or_default(),
                },
            );
            ok(json!(id))
        }
        "updateNoteFields" => {
            let id = params["note"]["id"].as_i64().unwrap_or_default();
            let fields = string_map(&params["note"]["fields"]);
            match state.notes.get_mut(&id) {
                Some(note) => {
                    note.fields.extend(fields);
                    ok(json!(null))
                }
                None => err("Note was not found"),
            }
        }
        "deleteNotes" => {
            for id in params["notes"].as_array().into_iter().flatten() {
                if let Some(id) = id.as_i64() {
                    state.notes.remove(&id);
                }
            }
            ok(json!(null))
        }
        "findNotes" => {
            let query = params["query"].as_str().unwrap_or_default();
            let ids: Vec<i64> = state
                .notes
                .iter()
                .filter(|(_, note)| note.matches(query))
                .map(|(id, _)| *id)
                .collect();
            ok(json!(ids))
        }
        "exportPackage" => ok(json!(true)),
        "reloadCollection" | "removeEmptyNotes" | "sync" => ok(json!(null)),
        _ => err("unsupported action"),
    }
}
