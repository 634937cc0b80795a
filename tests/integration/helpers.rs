//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use tagvault_api::AppState;
use tagvault_core::config::{AppConfig, StorageConfig};
use tagvault_database::{CatalogStore, MemoryCatalogStore};

const BOUNDARY: &str = "tagvault-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Wired application state, for direct access to the store and queue
    pub state: AppState,
    /// Keeps the data directory alive for the duration of the test
    _dir: TempDir,
}

impl TestApp {
    /// App over an in-memory catalog and an empty temporary tree.
    pub async fn new() -> Self {
        Self::with_tree(|_| {}).await
    }

    /// App whose physical tree is prepared by `prepare` before bootstrap.
    ///
    /// `prepare` receives the physical directory of the root folder. The
    /// startup reconciliation is run to completion before returning.
    pub async fn with_tree(prepare: impl FnOnce(&std::path::Path)) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let mut config = AppConfig::default();
        config.storage = StorageConfig::rooted_at(dir.path());
        config.worker.sync_on_startup = true;

        let root_dir =
            PathBuf::from(&config.storage.upload_root).join(&config.storage.root_folder_name);
        std::fs::create_dir_all(&root_dir).expect("Failed to create root dir");
        prepare(&root_dir);

        let store: Arc<dyn CatalogStore> = Arc::new(MemoryCatalogStore::new());
        let (state, router) = tagvault_api::bootstrap(config, store)
            .await
            .expect("Failed to bootstrap app");
        state.queue.wait_idle().await;

        Self {
            router,
            state,
            _dir: dir,
        }
    }

    /// Physical location of a logical path.
    pub fn physical(&self, logical: &str) -> PathBuf {
        self.state.disk.mapper().to_physical(logical)
    }

    /// Write a file straight to disk, bypassing the API.
    pub fn write_file(&self, logical: &str, contents: &[u8]) {
        let path = self.physical(logical);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(path, contents).expect("Failed to write file");
    }

    /// Wait for every queued background job to finish.
    pub async fn settle(&self) {
        self.state.queue.wait_idle().await;
    }

    /// Root folder id as a plain number.
    pub async fn root_id(&self) -> i64 {
        let (status, body) = self.get("/api/folders/root").await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["folder"]["id"].as_i64().expect("root id")
    }

    /// Send a request and return the status and JSON body.
    pub async fn request(&self, req: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.request_raw(req).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    /// Send a request and return the status and raw body.
    pub async fn request_raw(&self, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Request failed");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        (status, bytes.to_vec())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(json_request("POST", uri, body)).await
    }

    pub async fn put_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(json_request("PUT", uri, body)).await
    }

    pub async fn put(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Request::put(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Upload `(relative_path, contents)` items into a folder.
    pub async fn upload(&self, folder_id: i64, items: &[(&str, &[u8])]) -> (StatusCode, Value) {
        let req = Request::post(format!("/api/folders/{folder_id}/upload"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(items)))
            .unwrap();
        self.request(req).await
    }

    /// Create a folder through the API and return its id.
    pub async fn create_folder(&self, parent_id: i64, name: &str) -> i64 {
        let (status, body) = self
            .post_json(
                "/api/folders",
                serde_json::json!({ "parent_id": parent_id, "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["id"].as_i64().expect("folder id")
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Encode file parts as `multipart/form-data`.
pub fn multipart_body(items: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (path, contents) in items {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{path}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Names of the entries in a JSON array, sorted.
pub fn names(list: &Value) -> Vec<String> {
    let mut names: Vec<String> = list
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
