use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use base64::Engine as _;
use gameshelf::bridge::{contents_request_body, contents_url, ContentsApi};
use gameshelf::fetch::FetchResponse;
use gameshelf::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const FILE_URL: &str = "https://api.github.test/repos/acme/arcade/contents/data/games.json";

/// Answers the sha lookup and the upload with fixed responses and records
/// every call as `(method, url, token, body)`.
struct ScriptedContents {
    existing: FetchResponse,
    upload: FetchResponse,
    calls: Mutex<Vec<(&'static str, String, String, Option<Value>)>>,
}

impl ScriptedContents {
    fn new(existing: (u16, &str), upload: (u16, &str)) -> Arc<Self> {
        let reply = |(status, body): (u16, &str)| FetchResponse {
            status,
            content_type: Some("application/json".into()),
            body: body.as_bytes().to_vec(),
        };
        Arc::new(Self { existing: reply(existing), upload: reply(upload), calls: Mutex::new(Vec::new()) })
    }

    fn calls(&self) -> Vec<(&'static str, String, String, Option<Value>)> { self.calls.lock().unwrap().clone() }
}

#[async_trait]
impl ContentsApi for ScriptedContents {
    async fn get(&self, url: &str, token: &str) -> Result<FetchResponse> {
        self.calls.lock().unwrap().push(("GET", url.into(), token.into(), None));
        Ok(self.existing.clone())
    }

    async fn put(&self, url: &str, token: &str, body: &Value) -> Result<FetchResponse> {
        self.calls.lock().unwrap().push(("PUT", url.into(), token.into(), Some(body.clone())));
        Ok(self.upload.clone())
    }
}

fn publishing_bridge(contents: Arc<ScriptedContents>) -> LocalBridge {
    LocalBridge::new("unused.json").unwrap().with_api_base("https://api.github.test/").with_contents_api(contents)
}

fn record(id: &str) -> GameRecord {
    GameRecord {
        id: id.into(),
        name: id.to_uppercase(),
        description: "d".into(),
        version: "1.0.0".into(),
        download_url: "#".into(),
        size: "Unknown".into(),
        coming_soon: false,
        image: Some("data:image/png;base64,UE5H".into()),
    }
}

fn request() -> PublishRequest {
    PublishRequest {
        target: PublishTarget { owner: "acme".into(), repo: "arcade".into(), file_path: "/data/games.json".into() },
        token: "secret".into(),
        message: "Update".into(),
        payload: GamesDocument { games: vec![record("pong")] },
    }
}

#[tokio::test]
async fn local_save_writes_games_document() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("nested").join("games.json");
    let bridge = LocalBridge::new(&path).unwrap();

    bridge.save_games(&[record("pong"), record("snake")]).await.unwrap();

    let raw = tokio::fs::read_to_string(&path).await.unwrap();
    let doc: GamesDocument = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc.games.len(), 2);
    assert_eq!(doc.games[1].name, "SNAKE");
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(v["games"][0].get("downloadUrl").is_some());
    assert!(v["games"][0].get("comingSoon").is_some());
}

#[tokio::test]
async fn local_save_overwrites_previous_list() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("games.json");
    let bridge = LocalBridge::new(&path).unwrap();
    bridge.save_games(&[record("a"), record("b")]).await.unwrap();
    bridge.save_games(&[record("c")]).await.unwrap();
    let doc: GamesDocument = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc.games.iter().map(|g| g.id.as_str()).collect::<Vec<_>>(), vec!["c"]);
}

#[test]
fn contents_url_trims_slashes() {
    let r = request();
    assert_eq!(contents_url("https://api.github.com/", &r.target), "https://api.github.com/repos/acme/arcade/contents/data/games.json");
}

#[test]
fn contents_body_encodes_payload_and_carries_sha() {
    let r = request();
    let body = contents_request_body(&r, Some("abc123".into())).unwrap();
    assert_eq!(body["message"], "Update");
    assert_eq!(body["sha"], "abc123");
    let decoded = base64::engine::general_purpose::STANDARD.decode(body["content"].as_str().unwrap()).unwrap();
    let doc: GamesDocument = serde_json::from_slice(&decoded).unwrap();
    assert_eq!(doc.games[0].id, "pong");

    let fresh = contents_request_body(&r, None).unwrap();
    assert!(fresh.get("sha").is_none());
}

#[test]
fn publish_request_serializes_flat_coordinates() {
    let v = serde_json::to_value(request()).unwrap();
    assert_eq!(v["owner"], "acme");
    assert_eq!(v["filePath"], "/data/games.json");
    assert!(v["payload"]["games"].is_array());
}

#[tokio::test]
async fn publish_updates_existing_file_with_its_sha() {
    let contents = ScriptedContents::new((200, r#"{"sha":"abc123","name":"games.json"}"#), (200, r#"{"content":{}}"#));
    let outcome = publishing_bridge(contents.clone()).publish_games(request()).await;
    assert_eq!(outcome, PublishOutcome::success());

    let calls = contents.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!((calls[0].0, calls[0].1.as_str(), calls[0].2.as_str()), ("GET", FILE_URL, "secret"));
    let (method, url, token, body) = &calls[1];
    assert_eq!((*method, url.as_str(), token.as_str()), ("PUT", FILE_URL, "secret"));
    let body = body.as_ref().unwrap();
    assert_eq!(body["sha"], "abc123");
    assert_eq!(body["message"], "Update");
}

#[tokio::test]
async fn publish_creates_missing_file_without_sha() {
    let contents = ScriptedContents::new((404, r#"{"message":"Not Found"}"#), (201, "{}"));
    let outcome = publishing_bridge(contents.clone()).publish_games(request()).await;
    assert!(outcome.ok);
    let calls = contents.calls();
    let body = calls[1].3.as_ref().unwrap();
    assert!(body.get("sha").is_none());
    assert!(body["content"].is_string());
}

#[tokio::test]
async fn rejected_upload_is_reported_verbatim() {
    let contents = ScriptedContents::new((404, ""), (401, r#"{"message":"Bad credentials"}"#));
    let outcome = publishing_bridge(contents).publish_games(request()).await;
    assert!(!outcome.ok);
    let error = outcome.error.unwrap();
    assert!(error.contains("401"), "{error}");
    assert!(error.contains("Bad credentials"), "{error}");
}

#[tokio::test]
async fn failed_sha_lookup_skips_the_upload() {
    let contents = ScriptedContents::new((500, "oops"), (200, "{}"));
    let outcome = publishing_bridge(contents.clone()).publish_games(request()).await;
    assert!(!outcome.ok);
    assert!(outcome.error.unwrap().contains("500"));
    assert_eq!(contents.calls().len(), 1);
}

#[tokio::test]
async fn missing_file_loads_as_nothing_persisted() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let bridge = LocalBridge::new(dir.path().join("games.json")).unwrap();
    assert_eq!(bridge.load_games().await.unwrap(), None);
    bridge.save_games(&[record("pong")]).await.unwrap();
    let loaded = bridge.load_games().await.unwrap().unwrap();
    assert_eq!(loaded, vec![record("pong")]);
}
