use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::Value;
use tempfile::TempDir;

use sharebox::{
    app,
    config::Config,
    state::AppState,
    storage::LocalStorage,
    store::{MemStore, StoreBackend},
};

/// Spin up the app against a fresh in-memory store and a temporary blob
/// directory. The `TempDir` must outlive the server.
async fn test_server(max_file_size: u64) -> (TestServer, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        database_url: None,
        use_postgres: false,
        upload_dir: dir.path().display().to_string(),
        max_file_size,
        allowed_extensions: vec!["png".to_string(), "txt".to_string()],
        port: 0,
    };
    let state = AppState {
        store: StoreBackend::Memory(MemStore::new()),
        blobs: LocalStorage::new(dir.path()).await.unwrap(),
        config,
    };
    (TestServer::new(app(state)).unwrap(), dir)
}

async fn upload(server: &TestServer, filename: &str, mime: &str, content: &'static [u8]) -> Value {
    let part = Part::bytes(content).file_name(filename).mime_type(mime);
    let form = MultipartForm::new().add_part("file", part);

    let res = server.post("/api/upload").multipart(form).await;
    res.assert_status(StatusCode::CREATED);
    res.json()
}

#[tokio::test]
async fn health_check_responds() {
    let (server, _dir) = test_server(1024).await;
    let res = server.get("/health").await;
    res.assert_status_ok();
    res.assert_text("OK");
}

#[tokio::test]
async fn upload_returns_share_link() {
    let (server, _dir) = test_server(1024).await;

    let body = upload(&server, "photo.png", "image/png", b"not really a png").await;
    assert_eq!(body["display_name"], "photo.png");
    assert_eq!(body["content_type"], "image/png");
    assert_eq!(body["size_bytes"], 16);

    let share_id = body["share_id"].as_str().unwrap();
    assert_eq!(
        body["share_url"].as_str().unwrap(),
        format!("/api/files/{}", share_id)
    );
}

#[tokio::test]
async fn share_view_download_and_preview() {
    let (server, _dir) = test_server(1024).await;

    let body = upload(&server, "note.txt", "text/plain", b"hello world").await;
    let share_id = body["share_id"].as_str().unwrap().to_string();

    // First metadata view reports the counters as they were before it.
    let res = server.get(&format!("/api/files/{}", share_id)).await;
    res.assert_status_ok();
    let meta: Value = res.json();
    assert_eq!(meta["view_count"], 0);
    assert_eq!(meta["download_count"], 0);

    // Second view sees the first one counted.
    let meta: Value = server.get(&format!("/api/files/{}", share_id)).await.json();
    assert_eq!(meta["view_count"], 1);

    // Download serves the bytes back verbatim, as an attachment named
    // after the original file.
    let res = server
        .get(&format!("/api/files/{}/download", share_id))
        .await;
    res.assert_status_ok();
    assert_eq!(&res.as_bytes()[..], b"hello world");
    assert_eq!(
        res.headers().get("content-disposition").unwrap().to_str().unwrap(),
        "attachment; filename=\"note.txt\""
    );
    assert_eq!(
        res.headers().get("content-type").unwrap().to_str().unwrap(),
        "text/plain"
    );

    // Preview serves inline and bumps neither counter.
    let res = server.get(&format!("/api/files/{}/preview", share_id)).await;
    res.assert_status_ok();
    assert_eq!(&res.as_bytes()[..], b"hello world");
    assert_eq!(
        res.headers().get("content-disposition").unwrap().to_str().unwrap(),
        "inline"
    );

    let meta: Value = server.get(&format!("/api/files/{}", share_id)).await.json();
    assert_eq!(meta["view_count"], 2);
    assert_eq!(meta["download_count"], 1);
}

#[tokio::test]
async fn unknown_share_id_is_not_found() {
    let (server, _dir) = test_server(1024).await;

    for path in [
        "/api/files/nope404",
        "/api/files/nope404/download",
        "/api/files/nope404/preview",
    ] {
        server.get(path).await.assert_status_not_found();
    }
}

#[tokio::test]
async fn rejects_disallowed_extension() {
    let (server, _dir) = test_server(1024).await;

    let part = Part::bytes(b"MZ".as_slice())
        .file_name("evil.exe")
        .mime_type("application/octet-stream");
    let form = MultipartForm::new().add_part("file", part);

    let res = server.post("/api/upload").multipart(form).await;
    res.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);

    // The rejected upload must not leave a record behind.
    let files: Value = server.get("/api/admin/files").await.json();
    assert_eq!(files.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn rejects_oversize_payload() {
    let (server, _dir) = test_server(16).await;

    let part = Part::bytes(b"this is well over sixteen bytes".as_slice())
        .file_name("big.txt")
        .mime_type("text/plain");
    let form = MultipartForm::new().add_part("file", part);

    let res = server.post("/api/upload").multipart(form).await;
    res.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn rejects_upload_without_file_field() {
    let (server, _dir) = test_server(1024).await;

    let form = MultipartForm::new().add_text("comment", "no file here");
    let res = server.post("/api/upload").multipart(form).await;
    res.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_blob_surfaces_as_not_found() {
    let (server, dir) = test_server(1024).await;

    let body = upload(&server, "gone.txt", "text/plain", b"soon gone").await;
    let share_id = body["share_id"].as_str().unwrap().to_string();

    // Remove the stored bytes out from under the live record.
    for entry in std::fs::read_dir(dir.path()).unwrap() {
        let path = entry.unwrap().path();
        if path.is_file() {
            std::fs::remove_file(path).unwrap();
        }
    }

    // The byte-serving paths fail loudly as not-found.
    server
        .get(&format!("/api/files/{}/download", share_id))
        .await
        .assert_status_not_found();
    server
        .get(&format!("/api/files/{}/preview", share_id))
        .await
        .assert_status_not_found();

    // The metadata record itself is still live.
    server
        .get(&format!("/api/files/{}", share_id))
        .await
        .assert_status_ok();

    // Admin delete still succeeds; blob removal is best effort.
    let id = body["id"].as_i64().unwrap();
    server
        .delete(&format!("/api/admin/files/{}", id))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/api/files/{}", share_id))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn download_filename_with_quotes_is_escaped() {
    let (server, _dir) = test_server(1024).await;

    let body = upload(&server, "he\"llo\\world.txt", "text/plain", b"hi").await;
    let share_id = body["share_id"].as_str().unwrap();

    let res = server
        .get(&format!("/api/files/{}/download", share_id))
        .await;
    res.assert_status_ok();
    assert_eq!(
        res.headers().get("content-disposition").unwrap().to_str().unwrap(),
        "attachment; filename=\"he\\\"llo\\\\world.txt\""
    );
}

#[tokio::test]
async fn admin_list_stats_and_delete() {
    let (server, _dir) = test_server(1024).await;

    let first = upload(&server, "a.txt", "text/plain", b"aaaa").await;
    let second = upload(&server, "b.txt", "text/plain", b"bbbbbbbb").await;

    // Most recent upload comes first.
    let files: Value = server.get("/api/admin/files").await.json();
    let files = files.as_array().unwrap().clone();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["display_name"], "b.txt");
    assert_eq!(files[1]["display_name"], "a.txt");

    // One download against the second file shows up in the aggregates.
    let share_id = second["share_id"].as_str().unwrap();
    server
        .get(&format!("/api/files/{}/download", share_id))
        .await
        .assert_status_ok();

    let stats: Value = server.get("/api/admin/stats").await.json();
    assert_eq!(stats["total_files"], 2);
    assert_eq!(stats["total_downloads"], 1);
    assert_eq!(stats["total_size"], 12);

    // Delete the first file; both its metadata and its bytes are gone.
    let id = first["id"].as_i64().unwrap();
    let res = server.delete(&format!("/api/admin/files/{}", id)).await;
    res.assert_status(StatusCode::NO_CONTENT);

    let share_id = first["share_id"].as_str().unwrap();
    server
        .get(&format!("/api/files/{}", share_id))
        .await
        .assert_status_not_found();

    let stats: Value = server.get("/api/admin/stats").await.json();
    assert_eq!(stats["total_files"], 1);
    assert_eq!(stats["total_size"], 8);

    // Deleting an already-deleted id is not found at the HTTP boundary.
    server
        .delete(&format!("/api/admin/files/{}", id))
        .await
        .assert_status_not_found();
}
