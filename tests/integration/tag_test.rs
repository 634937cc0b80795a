//! Integration tests for tags and search.

mod helpers;

use http::StatusCode;
use serde_json::json;

use helpers::names;

async fn create_tag(app: &helpers::TestApp, name: &str) -> i64 {
    let (status, body) = app.post_json("/api/tags", json!({ "name": name })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_tag_crud() {
    let app = helpers::TestApp::new().await;

    let (status, body) = app
        .post_json("/api/tags", json!({ "name": "Summer Trip", "color": "#00AA00" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["slug"], "summer-trip");
    assert_eq!(body["data"]["color_hex"], "#00aa00");
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = app.post_json("/api/tags", json!({ "name": "summer trip" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.get("/api/tags").await;
    assert_eq!(names(&body["data"]), vec!["Summer Trip"]);

    let (status, _) = app.delete(&format!("/api/tags/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.delete(&format!("/api/tags/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_attach_and_detach_tags() {
    let app = helpers::TestApp::new().await;
    let root = app.root_id().await;
    let trips = app.create_folder(root, "trips").await;
    let (_, body) = app.upload(trips, &[("map.png", b"png")]).await;
    let file = body["data"][0]["id"].as_i64().unwrap();
    let tag = create_tag(&app, "Travel").await;

    let (status, body) = app.put(&format!("/api/folders/{trips}/tags/{tag}")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(names(&body["data"]), vec!["Travel"]);

    let (status, body) = app.put(&format!("/api/files/{file}/tags/{tag}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["data"]), vec!["Travel"]);

    let (_, body) = app.get(&format!("/api/files/{file}")).await;
    assert_eq!(names(&body["data"]["tags"]), vec!["Travel"]);

    let (status, body) = app.delete(&format!("/api/files/{file}/tags/{tag}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(names(&body["data"]).is_empty());

    let (status, _) = app.put(&format!("/api/folders/{trips}/tags/9999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get(&format!("/api/folders/{trips}/tags")).await;
    assert_eq!(names(&body["data"]), vec!["Travel"]);
}

#[tokio::test]
async fn test_search_by_name_and_tag() {
    let app = helpers::TestApp::new().await;
    let root = app.root_id().await;
    let trips = app.create_folder(root, "trips").await;
    app.upload(trips, &[("beach.jpg", b"1"), ("mountain.jpg", b"2")])
        .await;
    app.upload(root, &[("Beach-notes.txt", b"3")]).await;
    let tag = create_tag(&app, "Travel").await;
    app.put(&format!("/api/folders/{trips}/tags/{tag}")).await;

    let (status, body) = app.get("/api/search?q=beach").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["data"]), vec!["Beach-notes.txt", "beach.jpg"]);

    let (_, body) = app.get("/api/search?tag=travel").await;
    assert_eq!(names(&body["data"]), vec!["beach.jpg", "mountain.jpg"]);

    let (_, body) = app.get("/api/search?q=beach&tag=travel").await;
    assert_eq!(names(&body["data"]), vec!["beach.jpg"]);

    let (_, body) = app.get("/api/search").await;
    assert!(names(&body["data"]).is_empty());

    let (status, _) = app.get("/api/search?q=a&limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
