//! Integration tests for file upload, download, and lifecycle.

mod helpers;

use axum::body::Body;
use http::{Request, StatusCode, header};
use serde_json::json;

use helpers::names;

#[tokio::test]
async fn test_upload_and_download_roundtrip() {
    let app = helpers::TestApp::new().await;
    let root = app.root_id().await;

    let (status, body) = app.upload(root, &[("hello.txt", b"hello world")]).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let file = &body["data"][0];
    assert_eq!(file["name"], "hello.txt");
    assert_eq!(file["size_bytes"], 11);
    let id = file["id"].as_i64().unwrap();

    let response_req = Request::get(format!("/api/files/{id}/download"))
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = app.request_raw(response_req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"hello world");
}

#[tokio::test]
async fn test_download_sets_disposition_header() {
    let app = helpers::TestApp::new().await;
    let root = app.root_id().await;
    let (_, body) = app.upload(root, &[("my report.pdf", b"%PDF")]).await;
    let id = body["data"][0]["id"].as_i64().unwrap();

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        Request::get(format!("/api/files/{id}/download"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"my report.pdf\""));
    assert!(disposition.contains("filename*=UTF-8''my%20report.pdf"));
}

#[tokio::test]
async fn test_upload_creates_folder_chain() {
    let app = helpers::TestApp::new().await;
    let root = app.root_id().await;

    let (status, body) = app
        .upload(
            root,
            &[
                ("albums/summer/a.jpg", b"a"),
                ("albums/summer/b.jpg", b"b"),
                ("albums/c.jpg", b"c"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (_, body) = app.get("/api/folders/root").await;
    assert_eq!(names(&body["data"]["folders"]), vec!["albums"]);
    let albums = body["data"]["folders"][0]["id"].as_i64().unwrap();

    let (_, body) = app.get(&format!("/api/folders/{albums}")).await;
    assert_eq!(names(&body["data"]["folders"]), vec!["summer"]);
    assert_eq!(names(&body["data"]["files"]), vec!["c.jpg"]);

    let summer = body["data"]["folders"][0]["id"].as_i64().unwrap();
    let (_, body) = app.get(&format!("/api/folders/{summer}")).await;
    assert_eq!(body["data"]["folder"]["full_path"], "/root/albums/summer");
    assert_eq!(names(&body["data"]["files"]), vec!["a.jpg", "b.jpg"]);
    assert!(app.physical("/root/albums/summer").is_dir());
}

#[tokio::test]
async fn test_upload_rejects_traversal_and_unknown_folder() {
    let app = helpers::TestApp::new().await;
    let root = app.root_id().await;

    let (status, _) = app.upload(root, &[("../escape.txt", b"x")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.upload(9999, &[("a.txt", b"x")]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.upload(root, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/api/folders/root").await;
    assert!(names(&body["data"]["files"]).is_empty());
}

#[tokio::test]
async fn test_rename_and_delete_file() {
    let app = helpers::TestApp::new().await;
    let root = app.root_id().await;
    let (_, body) = app.upload(root, &[("draft.txt", b"draft")]).await;
    let id = body["data"][0]["id"].as_i64().unwrap();
    let storage_path = body["data"][0]["storage_path"].as_str().unwrap().to_string();

    let (status, body) = app
        .put_json(&format!("/api/files/{id}"), json!({ "name": "final.txt" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["name"], "final.txt");

    let (status, body) = app.get(&format!("/api/files/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "final.txt");
    assert!(body["data"]["tags"].as_array().unwrap().is_empty());

    let (status, _) = app.delete(&format!("/api/files/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    app.settle().await;
    assert!(!std::path::Path::new(&storage_path).exists());

    let (status, _) = app.get(&format!("/api/files/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_file_removed_on_disk_disappears() {
    let app = helpers::TestApp::new().await;
    let root = app.root_id().await;
    let (_, body) = app.upload(root, &[("temp.bin", b"123")]).await;
    let id = body["data"][0]["id"].as_i64().unwrap();
    let storage_path = body["data"][0]["storage_path"].as_str().unwrap().to_string();

    std::fs::remove_file(&storage_path).unwrap();

    let (_, body) = app.get("/api/folders/root").await;
    assert!(names(&body["data"]["files"]).is_empty());

    let (status, _) = app.get(&format!("/api/files/{id}/download")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.settle().await;
    let (status, _) = app.get(&format!("/api/files/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
