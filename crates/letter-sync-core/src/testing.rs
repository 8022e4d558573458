//! In-memory letters API used by unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::{Result, SyncError};
use crate::model::{Document, DocumentId, UpdateDocument};
use crate::transport::{Method, RawResponse, Transport};

#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct State {
    documents: BTreeMap<i64, Document>,
    next_id: i64,
    drive: Vec<Value>,
    export_result: Value,
    failures: HashMap<(Method, String), RawResponse>,
    offline: bool,
    requests: Vec<Recorded>,
}

/// Fake remote store: serves the documents routes from memory, records
/// every request and can be told to fail specific routes.
pub(crate) struct FakeRemote {
    state: Mutex<State>,
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1,
                export_result: json!({"id": "drive-file", "webViewLink": "https://drive/d/1"}),
                ..Default::default()
            }),
        }
    }

    pub fn seed(&self, title: &str, content: Option<Value>) -> Document {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        let doc = Document {
            id: DocumentId(id),
            title: title.to_string(),
            content,
            category: None,
            modified_time: Utc::now(),
        };
        state.documents.insert(id, doc.clone());
        doc
    }

    pub fn rename(&self, id: DocumentId, title: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(doc) = state.documents.get_mut(&id.0) {
            doc.title = title.to_string();
        }
    }

    pub fn set_drive(&self, items: Vec<Value>) {
        self.state.lock().unwrap().drive = items;
    }

    pub fn fail(&self, method: Method, path: &str, status: u16, payload: Value) {
        self.fail_raw(method, path, status, payload.to_string().into_bytes());
    }

    pub fn fail_raw(&self, method: Method, path: &str, status: u16, body: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert((method, path.to_string()), RawResponse { status, body });
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn handle(state: &mut State, method: Method, path: &str, body: Option<Value>) -> RawResponse {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        match (method, segments.as_slice()) {
            (Method::Get, ["api", "documents"]) => {
                let docs: Vec<&Document> = state.documents.values().collect();
                ok(json!(docs))
            }
            (Method::Get, ["api", "documents", "drive", "list"]) => ok(json!(state.drive)),
            (Method::Post, ["api", "documents"]) => {
                let body = body.unwrap_or(Value::Null);
                let id = state.next_id;
                state.next_id += 1;
                let doc = Document {
                    id: DocumentId(id),
                    title: body["title"].as_str().unwrap_or_default().to_string(),
                    content: body.get("content").cloned(),
                    category: None,
                    modified_time: Utc::now(),
                };
                state.documents.insert(id, doc.clone());
                ok(json!(doc))
            }
            (Method::Get, ["api", "documents", id]) => match lookup(state, id) {
                Some(doc) => ok(json!(doc)),
                None => not_found(),
            },
            (Method::Put, ["api", "documents", id]) => {
                let update: UpdateDocument =
                    serde_json::from_value(body.unwrap_or(Value::Null)).unwrap_or_default();
                match id.parse::<i64>().ok().and_then(|id| state.documents.get_mut(&id)) {
                    Some(doc) => {
                        update.apply(doc);
                        ok(json!(doc))
                    }
                    None => not_found(),
                }
            }
            (Method::Delete, ["api", "documents", id]) => {
                match id.parse::<i64>().ok().and_then(|id| state.documents.remove(&id)) {
                    Some(_) => RawResponse {
                        status: 204,
                        body: Vec::new(),
                    },
                    None => not_found(),
                }
            }
            (Method::Post, ["api", "documents", id, "save-to-drive"]) => match lookup(state, id) {
                Some(_) => ok(state.export_result.clone()),
                None => not_found(),
            },
            _ => RawResponse {
                status: 404,
                body: br#"{"message":"No such route"}"#.to_vec(),
            },
        }
    }
}

fn lookup<'a>(state: &'a State, id: &str) -> Option<&'a Document> {
    id.parse::<i64>().ok().and_then(|id| state.documents.get(&id))
}

fn ok(value: Value) -> RawResponse {
    RawResponse {
        status: 200,
        body: value.to_string().into_bytes(),
    }
}

fn not_found() -> RawResponse {
    RawResponse {
        status: 404,
        body: br#"{"message":"Document not found"}"#.to_vec(),
    }
}

#[async_trait]
impl Transport for FakeRemote {
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<RawResponse> {
        // Yield so concurrent callers interleave at the network boundary.
        tokio::task::yield_now().await;

        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(SyncError::Transport("connection refused".to_string()));
        }

        state.requests.push(Recorded {
            method,
            path: path.to_string(),
            body: body.clone(),
        });

        if let Some(failure) = state.failures.get(&(method, path.to_string())) {
            return Ok(failure.clone());
        }

        Ok(Self::handle(&mut state, method, path, body))
    }
}
