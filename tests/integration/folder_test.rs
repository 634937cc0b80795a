//! Integration tests for folder browsing and reconciliation.

mod helpers;

use http::StatusCode;
use serde_json::json;

use tagvault_core::types::FolderId;
use tagvault_database::CatalogStore;

use helpers::names;

#[tokio::test]
async fn test_health_reports_queue() {
    let app = helpers::TestApp::new().await;

    let (status, body) = app.get("/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert!(body["data"]["queue"].is_object());
}

#[tokio::test]
async fn test_startup_sync_discovers_existing_tree() {
    let app = helpers::TestApp::with_tree(|root| {
        std::fs::create_dir_all(root.join("photos/2023")).unwrap();
        std::fs::write(root.join("photos/2023/beach.jpg"), b"jpg").unwrap();
        std::fs::write(root.join("notes.txt"), b"notes").unwrap();
    })
    .await;

    let (status, body) = app.get("/api/folders/root").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["folder"]["full_path"], "/root");
    assert_eq!(names(&body["data"]["folders"]), vec!["photos"]);
    assert_eq!(names(&body["data"]["files"]), vec!["notes.txt"]);

    let photos = body["data"]["folders"][0]["id"].as_i64().unwrap();
    let (_, body) = app.get(&format!("/api/folders/{photos}")).await;
    let year = body["data"]["folders"][0]["id"].as_i64().unwrap();

    let (status, body) = app.get(&format!("/api/folders/{year}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["folder"]["full_path"], "/root/photos/2023");
    assert_eq!(names(&body["data"]["files"]), vec!["beach.jpg"]);

    let crumbs: Vec<_> = body["data"]["breadcrumbs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(crumbs, vec!["root", "photos", "2023"]);
}

#[tokio::test]
async fn test_create_rename_delete_folder() {
    let app = helpers::TestApp::new().await;
    let root = app.root_id().await;

    let docs = app.create_folder(root, "docs").await;
    assert!(app.physical("/root/docs").is_dir());

    let (status, body) = app
        .put_json(&format!("/api/folders/{docs}"), json!({ "name": "papers" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["full_path"], "/root/papers");

    app.settle().await;
    assert!(app.physical("/root/papers").is_dir());
    assert!(!app.physical("/root/docs").exists());

    let (status, _) = app.delete(&format!("/api/folders/{docs}")).await;
    assert_eq!(status, StatusCode::OK);
    app.settle().await;
    assert!(!app.physical("/root/papers").exists());

    let (status, body) = app.get(&format!("/api/folders/{docs}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_folder_rejects_bad_names_and_duplicates() {
    let app = helpers::TestApp::new().await;
    let root = app.root_id().await;
    app.create_folder(root, "docs").await;

    let (status, _) = app
        .post_json("/api/folders", json!({ "parent_id": root, "name": "docs" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .post_json("/api/folders", json!({ "parent_id": root, "name": "a/b" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, _) = app
        .post_json("/api/folders", json!({ "parent_id": 9999, "name": "x" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_root_cannot_be_renamed_or_deleted() {
    let app = helpers::TestApp::new().await;
    let root = app.root_id().await;

    let (status, _) = app
        .put_json(&format!("/api/folders/{root}"), json!({ "name": "other" }))
        .await;
    assert!(status.is_client_error());

    let (status, _) = app.delete(&format!("/api/folders/{root}")).await;
    assert!(status.is_client_error());
    assert!(app.physical("/root").is_dir());
}

#[tokio::test]
async fn test_sync_picks_up_new_and_vanished_entries() {
    let app = helpers::TestApp::new().await;
    let root = app.root_id().await;

    app.write_file("/root/drafts/one.md", b"1");
    app.write_file("/root/a.txt", b"a");

    let (status, body) = app.post_json(&format!("/api/folders/{root}/sync"), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["folders_added"], 1);
    assert_eq!(body["data"]["files_added"], 2);

    std::fs::remove_dir_all(app.physical("/root/drafts")).unwrap();
    let (_, body) = app.post_json(&format!("/api/folders/{root}/sync"), json!({})).await;
    assert_eq!(body["data"]["folders_scheduled_for_removal"], 1);
    app.settle().await;

    let (_, body) = app.get("/api/folders/root").await;
    assert!(names(&body["data"]["folders"]).is_empty());
    assert_eq!(names(&body["data"]["files"]), vec!["a.txt"]);
}

#[tokio::test]
async fn test_vanished_folder_is_hidden_then_removed() {
    let app = helpers::TestApp::new().await;
    let root = app.root_id().await;
    let gone = app.create_folder(root, "gone").await;
    std::fs::remove_dir_all(app.physical("/root/gone")).unwrap();

    let (status, body) = app.get("/api/folders/root").await;
    assert_eq!(status, StatusCode::OK);
    assert!(names(&body["data"]["folders"]).is_empty());

    let (status, _) = app.get(&format!("/api/folders/{gone}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.settle().await;
    assert!(app.state.store.find_folder(FolderId(gone)).await.unwrap().is_none());
}
