//! Integration tests for psdb-curator HTTP endpoints
//!
//! Tests cover:
//! - Health endpoint (no auth required)
//! - Public submission with multipart uploads
//! - Admin guard
//! - Approve, deny and pending listing
//! - Canonical entry maintenance

mod helpers;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use helpers::{album_song_fields, list_dir, MultipartBody, TestEnv, MP3_BYTES, PNG_BYTES};
use psdb_common::config::CuratorSection;
use psdb_curator::models::FileKind;
use serde_json::{json, Value};
use tower::util::ServiceExt;

fn multipart_request(uri: &str, body: MultipartBody) -> Request<Body> {
    let (content_type, bytes) = body.finish();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn submit_song(app: &Router, title: &str) -> String {
    let body = MultipartBody::new()
        .fields(&album_song_fields(title))
        .file("albumImg", "cover.png", "image/png", PNG_BYTES);
    let (status, body) = send(app, multipart_request("/submit", body)).await;
    assert_eq!(status, StatusCode::CREATED, "submit failed: {}", body);
    body["submissionId"].as_str().unwrap().to_string()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let env = TestEnv::new().await;
    let (status, body) = send(&env.app(), get_request("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "psdb-curator");
    assert!(body["version"].is_string());
}

// =============================================================================
// Submission
// =============================================================================

#[tokio::test]
async fn test_submit_stores_upload_and_queues() {
    let env = TestEnv::new().await;
    let app = env.app();

    let body = MultipartBody::new()
        .fields(&album_song_fields("Roygbiv"))
        .file("albumImg", "cover art.png", "image/png", PNG_BYTES)
        .file(
            "synths[0][presets][0][audio]",
            "lead.mp3",
            "audio/mpeg",
            MP3_BYTES,
        )
        .text("synths[0][name]", "Prophet-5")
        .text("synths[0][manufacturer]", "Sequential")
        .text("synths[0][presets][0][name]", "Lead 12");
    let request = Request::builder()
        .method("POST")
        .uri("/submit")
        .header("x-user-id", "17");
    let (content_type, bytes) = body.finish();
    let request = request
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let id = body["submissionId"].as_str().unwrap().to_string();

    let images = list_dir(env.config.upload_dirs().pending(FileKind::Image));
    let audio = list_dir(env.config.upload_dirs().pending(FileKind::Audio));
    assert_eq!(images.len(), 1);
    assert_eq!(audio.len(), 1);
    assert!(images[0].ends_with("cover_art.png") || images[0].ends_with("cover art.png"));

    let (status, body) = send(&app, get_request(&format!("/admin/pending/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], 17);
    assert_eq!(body["document"]["album"]["albumImg"], images[0].as_str());
    assert_eq!(body["document"]["song"]["songImg"], images[0].as_str());
    assert_eq!(
        body["document"]["synths"][0]["presets"][0]["audio"],
        audio[0].as_str()
    );
    assert_eq!(body["document"]["synths"][0]["presets"][0]["packName"], "Factory");
}

#[tokio::test]
async fn test_submit_rejects_unsupported_file_type() {
    let env = TestEnv::new().await;
    let body = MultipartBody::new()
        .fields(&album_song_fields("Roygbiv"))
        .file("albumImg", "cover.png", "image/png", PNG_BYTES)
        .file("songImg", "notes.txt", "text/plain", b"not an image at all");

    let (status, body) = send(&env.app(), multipart_request("/submit", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    // The image written before the rejection is removed again
    assert!(list_dir(env.config.upload_dirs().pending(FileKind::Image)).is_empty());
}

#[tokio::test]
async fn test_submit_rejects_oversized_file() {
    let env = TestEnv::with_section(CuratorSection {
        max_upload_bytes: 16,
        ..Default::default()
    })
    .await;
    let body = MultipartBody::new()
        .fields(&album_song_fields("Roygbiv"))
        .file("albumImg", "cover.png", "image/png", PNG_BYTES);

    let (status, body) = send(&env.app(), multipart_request("/submit", body)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_submit_rejects_invalid_user_header() {
    let env = TestEnv::new().await;
    let (content_type, bytes) = MultipartBody::new()
        .fields(&album_song_fields("Roygbiv"))
        .finish();
    let request = Request::builder()
        .method("POST")
        .uri("/submit")
        .header("x-user-id", "someone")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .unwrap();

    let (status, _) = send(&env.app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_without_main_artist_is_bad_request() {
    let env = TestEnv::new().await;
    let body = MultipartBody::new()
        .text("song[title]", "Olson")
        .text("single", "yes")
        .file("songImg", "front.png", "image/png", PNG_BYTES);

    let (status, body) = send(&env.app(), multipart_request("/submit", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("Main"));
    assert!(list_dir(env.config.upload_dirs().pending(FileKind::Image)).is_empty());
}

// =============================================================================
// Admin guard
// =============================================================================

#[tokio::test]
async fn test_admin_routes_require_token() {
    let env = TestEnv::with_section(CuratorSection {
        admin_token: Some("s3cret".to_string()),
        ..Default::default()
    })
    .await;
    let app = env.app();

    let (status, body) = send(&app, get_request("/admin/pending")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let wrong = Request::builder()
        .uri("/admin/pending")
        .header("x-admin-token", "guess")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, wrong).await.0, StatusCode::UNAUTHORIZED);

    let right = Request::builder()
        .uri("/admin/pending")
        .header("x-admin-token", "s3cret")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, right).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    // Public routes stay open
    assert_eq!(send(&app, get_request("/health")).await.0, StatusCode::OK);
}

// =============================================================================
// Review
// =============================================================================

#[tokio::test]
async fn test_list_pending_oldest_first() {
    let env = TestEnv::new().await;
    let app = env.app();
    let first = submit_song(&app, "Roygbiv").await;
    let second = submit_song(&app, "Aquarius").await;

    let (status, body) = send(&app, get_request("/admin/pending")).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![first.as_str(), second.as_str()]);
}

#[tokio::test]
async fn test_get_pending_unknown_and_invalid_ids() {
    let env = TestEnv::new().await;
    let app = env.app();

    let (status, _) = send(
        &app,
        get_request("/admin/pending/00000000-0000-4000-8000-000000000000"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get_request("/admin/pending/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_approve_submission_with_edits() {
    let env = TestEnv::new().await;
    let app = env.app();
    let id = submit_song(&app, "Roygbiv").await;

    let body = MultipartBody::new()
        .text("entryId", &id)
        .text("song[genre]", "Downtempo");
    let (status, body) = send(&app, multipart_request("/admin/approve-submission", body)).await;

    assert_eq!(status, StatusCode::OK, "approve failed: {}", body);
    assert_eq!(body["success"], true);
    let song_id = body["result"]["ids"]["songId"].as_i64().unwrap();
    assert_eq!(body["result"]["promoted"].as_array().unwrap().len(), 1);

    let (status, song) = send(&app, get_request(&format!("/admin/entry/songs/{}", song_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(song["song_title"], "Roygbiv");
    assert_eq!(song["song_genre"], "Downtempo");

    // Album cover moved to approved storage, shared by song and album
    let approved = list_dir(env.config.upload_dirs().approved(FileKind::Image));
    assert_eq!(approved.len(), 1);
    assert_eq!(song["song_img"], approved[0].as_str());

    let (status, _) = send(&app, get_request(&format!("/admin/pending/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_approve_submission_requires_entry_id() {
    let env = TestEnv::new().await;
    let app = env.app();

    let body = MultipartBody::new()
        .text("song[genre]", "Downtempo")
        .file("songImg", "front.png", "image/png", PNG_BYTES);
    let (status, _) = send(&app, multipart_request("/admin/approve-submission", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(list_dir(env.config.upload_dirs().pending(FileKind::Image)).is_empty());

    let body = MultipartBody::new().text("entryId", "12");
    let (status, _) = send(&app, multipart_request("/admin/approve-submission", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deny_submission() {
    let env = TestEnv::new().await;
    let app = env.app();
    let id = submit_song(&app, "Roygbiv").await;
    assert_eq!(list_dir(env.config.upload_dirs().pending(FileKind::Image)).len(), 1);

    let request = json_request("POST", "/admin/deny-submission", json!({ "submissionId": id }));
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["discarded"].as_array().unwrap().len(), 1);
    assert!(list_dir(env.config.upload_dirs().pending(FileKind::Image)).is_empty());

    let request = json_request("POST", "/admin/deny-submission", json!({ "submissionId": id }));
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_deny_submission_rejects_malformed_body() {
    let env = TestEnv::new().await;
    let app = env.app();

    let request = Request::builder()
        .method("POST")
        .uri("/admin/deny-submission")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"submissionId\":"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, body) = send(&app, json_request("POST", "/admin/deny-submission", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_direct_upload() {
    let env = TestEnv::new().await;
    let app = env.app();

    let body = MultipartBody::new()
        .fields(&album_song_fields("Music Is Math"))
        .file("songImg", "front.png", "image/png", PNG_BYTES);
    let (status, body) = send(&app, multipart_request("/admin/upload", body)).await;

    assert_eq!(status, StatusCode::OK, "upload failed: {}", body);
    assert!(body["result"]["ids"]["songId"].as_i64().unwrap() > 0);
    assert_eq!(list_dir(env.config.upload_dirs().approved(FileKind::Image)).len(), 1);
    assert_eq!(send(&app, get_request("/admin/pending")).await.1, json!([]));
}

// =============================================================================
// Entries
// =============================================================================

#[tokio::test]
async fn test_entry_update_and_delete() {
    let env = TestEnv::new().await;
    let app = env.app();
    let artist_id = env.seed_artist("Autechre", "UK", None).await;
    let uri = format!("/admin/entry/artists/{}", artist_id);

    let (status, body) = send(&app, json_request("PUT", &uri, json!({ "country": "GB" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, artist) = send(&app, get_request(&uri)).await;
    assert_eq!(artist["artist_name"], "Autechre");
    assert_eq!(artist["country"], "GB");

    let (status, _) = send(&app, json_request("PUT", &uri, json!({ "artist_id": 99 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let delete = Request::builder()
        .method("DELETE")
        .uri(&uri)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, delete).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get_request(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_entry_update_onto_existing_key_is_bad_request() {
    let env = TestEnv::new().await;
    let app = env.app();
    let moved = env.seed_artist("Autechre", "UK", None).await;
    env.seed_artist("Autechre", "GB", None).await;
    let uri = format!("/admin/entry/artists/{}", moved);

    let (status, body) = send(&app, json_request("PUT", &uri, json!({ "country": "GB" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (_, artist) = send(&app, get_request(&uri)).await;
    assert_eq!(artist["country"], "UK");

    let (status, body) = send(&app, json_request("PUT", &uri, json!(["country"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_entry_rejects_unknown_table_and_id() {
    let env = TestEnv::new().await;
    let app = env.app();

    let (status, body) = send(&app, get_request("/admin/entry/users/1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Invalid table name"));

    let (status, _) = send(&app, get_request("/admin/entry/songs/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get_request("/admin/entry/songs/404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, json_request("PUT", "/admin/entry/songs/404", json!({ "song_genre": "IDM" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
