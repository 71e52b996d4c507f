mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use common::*;
use media_ingest::LogStatus;
use media_ingest::repository::FileRepository;
use media_ingest::server::{AppState, router};
use serde_json::Value;
use tower::ServiceExt;

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn dl_rejects_invalid_queries() {
    let h = harness(FakeProber::ok("1", "1x1"), 1, 1);
    let app = router(AppState::new(h.manager.clone()));
    let hash = md5_hex(b"x");

    for uri in [
        format!("/dl?md5={hash}"),
        format!("/dl?url=not-a-url&md5={hash}"),
        "/dl?url=http://h/a.mp4".to_string(),
        "/dl?url=http://h/a.mp4&md5=abc".to_string(),
    ] {
        let (status, body) = get(app.clone(), &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(json(&body)["error"].is_string());
    }
}

#[tokio::test]
async fn dl_enqueues_valid_task() {
    let h = harness(FakeProber::ok("1", "1x1"), 1, 1);
    let app = router(AppState::new(h.manager.clone()));
    let hash = md5_hex(b"x");

    let (status, body) = get(app, &format!("/dl?url=http://h/a.mp4&md5={hash}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn dl_after_stop_is_unavailable() {
    let h = harness(FakeProber::ok("1", "1x1"), 1, 1);
    h.manager.stop().await;
    let app = router(AppState::new(h.manager.clone()));

    let (status, body) = get(app, &format!("/dl?url=http://h/a.mp4&md5={}", md5_hex(b"x"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json(&body)["error"].is_string());
}

#[tokio::test]
async fn st_returns_full_and_filtered_documents() {
    let h = harness(FakeProber::ok("1", "1x1"), 1, 1);
    let a = h.repository.insert_file("http://h/a.mp4", &md5_hex(b"a")).await.unwrap();
    let b = h.repository.insert_file("http://h/b.mp4", &md5_hex(b"b")).await.unwrap();
    h.repository.update_file(a, "800000", "640x360").await.unwrap();
    h.repository.append_log(a, LogStatus::Completed, "Task completed").await.unwrap();
    h.repository.append_log(b, LogStatus::Pending, "Start processing task").await.unwrap();
    let app = router(AppState::new(h.manager.clone()));

    let (status, body) = get(app.clone(), "/st").await;
    assert_eq!(status, StatusCode::OK);
    let doc = json(&body);
    assert_eq!(doc.as_object().unwrap().len(), 2);
    assert_eq!(doc["http://h/a.mp4"]["resolution"], "640x360");
    assert_eq!(doc["http://h/a.mp4"]["bitrate"], "800000");
    assert_eq!(doc["http://h/a.mp4"]["log"][0]["status"], "4");
    assert_eq!(doc["http://h/b.mp4"]["log"][0]["status"], "1");
    assert_eq!(doc["http://h/b.mp4"]["log"][0]["message"], "Start processing task");

    let (status, body) = get(app.clone(), "/st?url=http://h/b.mp4").await;
    assert_eq!(status, StatusCode::OK);
    let doc = json(&body);
    assert_eq!(doc.as_object().unwrap().len(), 1);
    assert_eq!(doc["http://h/b.mp4"]["hash"], md5_hex(b"b"));

    let (status, body) = get(
        app.clone(),
        &format!("/st?url=http://h/b.mp4&md5={}", md5_hex(b"a")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json(&body).as_object().unwrap().is_empty());
}

#[tokio::test]
async fn st_rejects_unparseable_url() {
    let h = harness(FakeProber::ok("1", "1x1"), 1, 1);
    let app = router(AppState::new(h.manager.clone()));

    let (status, body) = get(app, "/st?url=nope").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].is_string());
}
