//! In-process mock of the search service document API.
//!
//! The mock serves `POST /indexes/{index}/docs/search` and
//! `POST /indexes/{index}/docs/index`, keeps its documents in memory, applies
//! delete batches and records every request so tests can assert on headers,
//! query parameters and bodies.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// A request received by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// `search` or `index`
    pub operation: String,
    pub index: String,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct MockState {
    documents: Vec<(String, Option<String>)>,
    api_key: Option<String>,
    search_failure: Option<(u16, String)>,
    delete_failure: Option<(u16, String)>,
    requests: Vec<RecordedRequest>,
}

#[derive(Clone, Default)]
pub struct MockSearchService {
    state: Arc<Mutex<MockState>>,
}

impl MockSearchService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a document; `None` content is served as JSON `null`
    pub fn with_document(self, id: &str, content: Option<&str>) -> Self {
        self.lock()
            .documents
            .push((id.to_string(), content.map(str::to_string)));
        self
    }

    pub fn with_documents<'a>(self, docs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        for (id, content) in docs {
            self.lock()
                .documents
                .push((id.to_string(), Some(content.to_string())));
        }
        self
    }

    /// Reject requests whose `api-key` header differs with `403 Forbidden`
    pub fn with_api_key(self, key: &str) -> Self {
        self.lock().api_key = Some(key.to_string());
        self
    }

    /// Answer every search request with `status` and `body`
    pub fn fail_search(self, status: u16, body: &str) -> Self {
        self.lock().search_failure = Some((status, body.to_string()));
        self
    }

    /// Answer every index batch with `status` and `body`, leaving documents
    /// untouched
    pub fn fail_delete(self, status: u16, body: &str) -> Self {
        self.lock().delete_failure = Some((status, body.to_string()));
        self
    }

    /// Ids currently held by the mock, in insertion order
    pub fn document_ids(&self) -> Vec<String> {
        self.lock()
            .documents
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Bodies of all index batch requests received
    pub fn index_batches(&self) -> Vec<Value> {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.operation == "index")
            .map(|r| r.body.clone())
            .collect()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/indexes/:index/docs/search", post(search))
            .route("/indexes/:index/docs/index", post(index_batch))
            .with_state(self.clone())
    }

    /// Serve the mock on an ephemeral local port and return its base URL
    pub async fn spawn(&self) -> std::io::Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = self.router();

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("Mock search service stopped: {e}");
            }
        });

        Ok(format!("http://{addr}"))
    }

    /// Record the request and check the api key
    fn accept(
        &self,
        operation: &str,
        index: String,
        params: &HashMap<String, String>,
        headers: &HeaderMap,
        body: Value,
    ) -> Result<(), Response> {
        let api_key = headers
            .get("api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut state = self.lock();
        state.requests.push(RecordedRequest {
            operation: operation.to_string(),
            index,
            api_key: api_key.clone(),
            api_version: params.get("api-version").cloned(),
            body,
        });

        match &state.api_key {
            Some(expected) if api_key.as_ref() != Some(expected) => Err((
                StatusCode::FORBIDDEN,
                Json(json!({"error": {"code": "", "message": "Invalid api-key"}})),
            )
                .into_response()),
            _ => Ok(()),
        }
    }
}

fn failure(status: u16, body: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, body.to_string()).into_response()
}

async fn search(
    State(mock): State<MockSearchService>,
    Path(index): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = mock.accept("search", index, &params, &headers, body) {
        return rejection;
    }

    let state = mock.lock();
    if let Some((status, body)) = &state.search_failure {
        return failure(*status, body);
    }

    let value: Vec<Value> = state
        .documents
        .iter()
        .map(|(id, content)| json!({"@search.score": 1.0, "id": id, "content": content}))
        .collect();

    Json(json!({ "value": value })).into_response()
}

async fn index_batch(
    State(mock): State<MockSearchService>,
    Path(index): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let actions = body["value"].as_array().cloned().unwrap_or_default();

    if let Err(rejection) = mock.accept("index", index, &params, &headers, body) {
        return rejection;
    }

    let mut state = mock.lock();
    if let Some((status, body)) = &state.delete_failure {
        return failure(*status, body);
    }

    let deleted: HashSet<String> = actions
        .iter()
        .filter(|a| a["@search.action"] == "delete")
        .filter_map(|a| a["id"].as_str().map(str::to_string))
        .collect();
    state.documents.retain(|(id, _)| !deleted.contains(id));

    let results: Vec<Value> = actions
        .iter()
        .map(|a| json!({"key": a["id"], "status": true, "errorMessage": null, "statusCode": 200}))
        .collect();

    Json(json!({ "value": results })).into_response()
}
