//! Integration tests for the Zoom client against a local mock of the
//! recording API.

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use zoom_archive::config::{Config, Secret};
use zoom_archive::error::ApiError;
use zoom_archive::fetcher::{exit_code_for, FetchOptions, Fetcher};
use zoom_archive::filename::FilenameDeriver;
use zoom_archive::zoom::{AccessToken, MeetingId, RecordingService, RecordingWindow, ZoomClient};

const VIDEO: &[u8] = b"not really an mp4 but close enough";

#[derive(Clone)]
struct MockState {
    base: String,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockState {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some("Bearer tok")
}

async fn token(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    state.record(format!(
        "token {}",
        query.get("account_id").cloned().unwrap_or_default()
    ));
    let basic = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    // base64("client:secret")
    if basic != Some("Basic Y2xpZW50OnNlY3JldA==")
        || query.get("grant_type").map(String::as_str) != Some("account_credentials")
        || query.get("account_id").map(String::as_str) != Some("acct")
    {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({
        "access_token": "tok",
        "token_type": "bearer",
        "expires_in": 3600
    })))
}

async fn recordings(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    if !bearer_ok(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    state.record(format!(
        "list from={} page_size={} token={}",
        query.get("from").cloned().unwrap_or_default(),
        query.get("page_size").cloned().unwrap_or_default(),
        query.get("next_page_token").cloned().unwrap_or_default()
    ));

    let video_url = format!("{}/files/video.mp4", state.base);
    let body = match query.get("next_page_token").map(String::as_str) {
        None => json!({
            "from": "2022-09-05",
            "next_page_token": "page-2",
            "meetings": [{
                "id": 111,
                "topic": "Standup",
                "timezone": "GMT+08:00",
                "recording_files": [
                    { "file_type": "MP4", "download_url": video_url, "recording_start": "2023-09-05T05:00:32Z", "file_size": VIDEO.len() },
                    { "file_type": "M4A", "download_url": "ignored", "recording_start": "2023-09-05T05:00:32Z" }
                ]
            }]
        }),
        Some("page-2") => json!({
            "next_page_token": "",
            "meetings": [{
                "id": 222,
                "topic": "Retro",
                "timezone": "GMT-05:00",
                "recording_files": [
                    { "file_type": "MP4", "download_url": video_url, "recording_start": "2023-01-15T10:00:00Z" }
                ]
            }]
        }),
        Some(_) => return Err(StatusCode::BAD_REQUEST),
    };
    Ok(Json(body))
}

async fn video(headers: HeaderMap) -> Result<Vec<u8>, StatusCode> {
    if !bearer_ok(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(VIDEO.to_vec())
}

async fn missing() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn delete_recordings(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> StatusCode {
    if !bearer_ok(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    state.record(format!(
        "delete {} {}",
        id,
        query.get("action").cloned().unwrap_or_default()
    ));
    if id == "404" {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn start_mock() -> MockState {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = MockState {
        base: format!("http://{addr}"),
        calls: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .route("/oauth/token", post(token))
        .route("/v2/users/me/recordings", get(recordings))
        .route("/v2/meetings/:id/recordings", delete(delete_recordings))
        .route("/files/video.mp4", get(video))
        .route("/files/missing.mp4", get(missing))
        .with_state(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    state
}

fn config_for(base: &str) -> Config {
    let mut config = Config::default();
    config.zoom.account_id = "acct".to_string();
    config.zoom.client_id = "client".to_string();
    config.zoom.client_secret = Secret::new("secret");
    config.zoom.oauth_base_url = base.to_string();
    config.zoom.api_base_url = format!("{base}/v2");
    config
}

fn window() -> RecordingWindow {
    RecordingWindow {
        from: NaiveDate::from_ymd_opt(2022, 9, 5).unwrap(),
        to: None,
    }
}

fn no_progress(_: u64, _: Option<u64>) {}

#[tokio::test]
async fn test_authenticate_uses_basic_auth() {
    let mock = start_mock().await;
    let client = ZoomClient::from_config(&config_for(&mock.base)).unwrap();

    let token = client.authenticate().await.unwrap();
    assert_eq!(token.as_str(), "tok");
    assert_eq!(mock.calls(), vec!["token acct"]);
}

#[tokio::test]
async fn test_wrong_secret_surfaces_status() {
    let mock = start_mock().await;
    let mut config = config_for(&mock.base);
    config.zoom.client_secret = Secret::new("wrong");
    let client = ZoomClient::from_config(&config).unwrap();

    let err = client.authenticate().await.unwrap_err();
    let status = err
        .downcast_ref::<ApiError>()
        .and_then(ApiError::status)
        .map(|status| status.as_u16());
    assert_eq!(status, Some(401));
}

#[tokio::test]
async fn test_listing_follows_pages() {
    let mock = start_mock().await;
    let client = ZoomClient::from_config(&config_for(&mock.base)).unwrap();
    let token = AccessToken::new("tok");

    let meetings = client.list_recordings(&token, &window()).await.unwrap();

    let ids: Vec<_> = meetings.iter().map(|m| m.id.clone()).collect();
    assert_eq!(ids, vec![MeetingId::Numeric(111), MeetingId::Numeric(222)]);
    assert_eq!(
        mock.calls(),
        vec![
            "list from=2022-09-05 page_size=300 token=",
            "list from=2022-09-05 page_size=300 token=page-2"
        ]
    );
}

#[tokio::test]
async fn test_download_streams_to_disk() {
    let mock = start_mock().await;
    let client = ZoomClient::from_config(&config_for(&mock.base)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("2023-09-05T07-00-32+0200.mp4");
    let seen = Mutex::new(Vec::new());

    let written = client
        .download(
            &AccessToken::new("tok"),
            &format!("{}/files/video.mp4", mock.base),
            &destination,
            &|written, total| seen.lock().unwrap().push((written, total)),
        )
        .await
        .unwrap();

    assert_eq!(written, VIDEO.len() as u64);
    assert_eq!(std::fs::read(&destination).unwrap(), VIDEO);
    assert!(!dir.path().join("2023-09-05T07-00-32+0200.mp4.part").exists());
    let seen = seen.lock().unwrap();
    assert_eq!(
        seen.last().copied(),
        Some((VIDEO.len() as u64, Some(VIDEO.len() as u64)))
    );
}

#[tokio::test]
async fn test_failed_download_leaves_nothing_behind() {
    let mock = start_mock().await;
    let client = ZoomClient::from_config(&config_for(&mock.base)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("missing.mp4");

    let err = client
        .download(
            &AccessToken::new("tok"),
            &format!("{}/files/missing.mp4", mock.base),
            &destination,
            &no_progress,
        )
        .await
        .unwrap_err();

    assert!(format!("{err}").contains("404"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_failed_rename_removes_partial_file() {
    let mock = start_mock().await;
    let client = ZoomClient::from_config(&config_for(&mock.base)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    // A non-empty directory in the way makes the final rename fail.
    let destination = dir.path().join("taken.mp4");
    std::fs::create_dir(&destination).unwrap();
    std::fs::write(destination.join("keep"), b"x").unwrap();

    let err = client
        .download(
            &AccessToken::new("tok"),
            &format!("{}/files/video.mp4", mock.base),
            &destination,
            &no_progress,
        )
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("Failed to move download"));
    assert!(!dir.path().join("taken.mp4.part").exists());
    assert!(destination.join("keep").exists());
}

#[tokio::test]
async fn test_delete_accepts_no_content_and_reports_failures() {
    let mock = start_mock().await;
    let client = ZoomClient::from_config(&config_for(&mock.base)).unwrap();
    let token = AccessToken::new("tok");

    client
        .delete_recordings(&token, &MeetingId::Numeric(42))
        .await
        .unwrap();
    let err = client
        .delete_recordings(&token, &MeetingId::Numeric(404))
        .await
        .unwrap_err();

    assert!(format!("{err}").contains("404"));
    assert_eq!(mock.calls(), vec!["delete 42 trash", "delete 404 trash"]);
}

#[tokio::test]
async fn test_full_fetch_against_mock() {
    let mock = start_mock().await;
    let client = ZoomClient::from_config(&config_for(&mock.base)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let options = FetchOptions {
        window: window(),
        output_dir: dir.path().join("recordings"),
        dry_run: false,
        keep_remote: false,
        skip_existing: false,
    };

    let report = Fetcher::new(&client, FilenameDeriver::default())
        .run(&options)
        .await
        .unwrap();

    assert_eq!(report.meetings_listed, 2);
    assert_eq!(report.downloaded.len(), 2);
    assert_eq!(report.deleted, vec![MeetingId::Numeric(111), MeetingId::Numeric(222)]);
    for name in ["2023-09-05T07-00-32+0200.mp4", "2023-01-15T11-00-00+0100.mp4"] {
        assert_eq!(std::fs::read(options.output_dir.join(name)).unwrap(), VIDEO);
    }

    let calls = mock.calls();
    assert_eq!(calls.first().map(String::as_str), Some("token acct"));
    assert_eq!(
        &calls[calls.len() - 2..],
        &["delete 111 trash".to_string(), "delete 222 trash".to_string()]
    );
}

#[tokio::test]
async fn test_fetch_halts_on_auth_failure() {
    let mock = start_mock().await;
    let mut config = config_for(&mock.base);
    config.zoom.account_id = "someone-else".to_string();
    let client = ZoomClient::from_config(&config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let options = FetchOptions {
        window: window(),
        output_dir: dir.path().to_path_buf(),
        dry_run: false,
        keep_remote: false,
        skip_existing: false,
    };

    let err = Fetcher::new(&client, FilenameDeriver::default())
        .run(&options)
        .await
        .unwrap_err();

    assert_eq!(exit_code_for(&err), 1);
    assert_eq!(mock.calls(), vec!["token someone-else"]);
}
