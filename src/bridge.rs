//! Privileged host capabilities: local persistence and remote publishing.
//!
//! The editor only ever sees `Option<Arc<dyn HostBridge>>`; when it is
//! `None` every mutating operation is refused.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::fetch::{read_response, FetchResponse};
use crate::types::{GameRecord, GamesDocument};

/// Repository coordinate a list is published to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishTarget {
    pub owner: String,
    pub repo: String,
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[serde(flatten)]
    pub target: PublishTarget,
    pub token: String,
    pub message: String,
    pub payload: GamesDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PublishOutcome {
    pub fn success() -> Self { Self { ok: true, error: None } }
    pub fn failure(error: impl Into<String>) -> Self { Self { ok: false, error: Some(error.into()) } }
}

#[async_trait]
pub trait HostBridge: Send + Sync {
    /// The list this bridge persisted last time, if it holds one. The editor
    /// starts from it instead of the published sources.
    async fn load_games(&self) -> Result<Option<Vec<GameRecord>>> { Ok(None) }
    async fn save_games(&self, games: &[GameRecord]) -> Result<()>;
    async fn publish_games(&self, request: PublishRequest) -> PublishOutcome;
}

/// Authenticated calls against the GitHub contents API.
#[async_trait]
pub trait ContentsApi: Send + Sync {
    async fn get(&self, url: &str, token: &str) -> Result<FetchResponse>;
    async fn put(&self, url: &str, token: &str, body: &Value) -> Result<FetchResponse>;
}

pub struct GithubContents {
    client: reqwest::Client,
}

impl GithubContents {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(concat!("gameshelf/", env!("CARGO_PKG_VERSION"))).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentsApi for GithubContents {
    async fn get(&self, url: &str, token: &str) -> Result<FetchResponse> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        read_response(resp, url).await
    }

    async fn put(&self, url: &str, token: &str, body: &Value) -> Result<FetchResponse> {
        let resp = self
            .client
            .put(url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(body)
            .send()
            .await
            .with_context(|| format!("PUT {url}"))?;
        read_response(resp, url).await
    }
}

/// Writes the list to a local JSON file and publishes through the GitHub
/// contents API.
pub struct LocalBridge {
    path: PathBuf,
    api_base: String,
    contents: Arc<dyn ContentsApi>,
}

#[derive(Deserialize)]
struct ContentsFile {
    sha: Option<String>,
}

impl LocalBridge {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self { path: path.into(), api_base: "https://api.github.com".to_string(), contents: Arc::new(GithubContents::new()?) })
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_contents_api(mut self, contents: Arc<dyn ContentsApi>) -> Self {
        self.contents = contents;
        self
    }

    pub fn path(&self) -> &std::path::Path { &self.path }

    async fn try_publish(&self, req: &PublishRequest) -> Result<()> {
        let url = contents_url(&self.api_base, &req.target);
        let existing = self.contents.get(&url, &req.token).await?;
        let sha = match existing.status {
            _ if existing.is_success() => existing.json::<ContentsFile>().context("decoding existing file")?.sha,
            404 => None,
            s => bail!("GitHub answered {s} while reading {}", req.target.file_path),
        };

        let body = contents_request_body(req, sha)?;
        let resp = self.contents.put(&url, &req.token, &body).await?;
        if !resp.is_success() {
            bail!("GitHub answered {}: {}", resp.status, String::from_utf8_lossy(&resp.body).trim());
        }
        Ok(())
    }
}

#[async_trait]
impl HostBridge for LocalBridge {
    async fn load_games(&self) -> Result<Option<Vec<GameRecord>>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading {}", self.path.display())),
        };
        let doc: Value = serde_json::from_slice(&raw).with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(Some(GamesDocument::from_value(&doc).games))
    }

    async fn save_games(&self, games: &[GameRecord]) -> Result<()> {
        let doc = GamesDocument { games: games.to_vec() };
        let bytes = serde_json::to_vec_pretty(&doc)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_context(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::write(&self.path, bytes).await.with_context(|| format!("writing {}", self.path.display()))?;
        info!(path = %self.path.display(), count = games.len(), "saved games");
        Ok(())
    }

    async fn publish_games(&self, request: PublishRequest) -> PublishOutcome {
        match self.try_publish(&request).await {
            Ok(()) => {
                info!(owner = %request.target.owner, repo = %request.target.repo, path = %request.target.file_path, "published games");
                PublishOutcome::success()
            }
            Err(e) => PublishOutcome::failure(format!("{e:#}")),
        }
    }
}

pub fn contents_url(api_base: &str, target: &PublishTarget) -> String {
    format!(
        "{}/repos/{}/{}/contents/{}",
        api_base.trim_end_matches('/'),
        target.owner,
        target.repo,
        target.file_path.trim_start_matches('/')
    )
}

/// Body of a contents API `PUT`. `sha` is required by GitHub when the file
/// already exists.
pub fn contents_request_body(req: &PublishRequest, sha: Option<String>) -> Result<Value> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(serde_json::to_vec_pretty(&req.payload)?);
    let mut body = serde_json::json!({ "message": req.message, "content": encoded });
    if let Some(sha) = sha { body["sha"] = Value::String(sha); }
    Ok(body)
}
