use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// A completed HTTP exchange. Transport failures never produce one.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }

    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.clone()).context("response body is not valid UTF-8")
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).context("response body is not valid JSON")
    }

    pub fn is_html(&self) -> bool {
        match &self.content_type {
            Some(ct) => ct.to_ascii_lowercase().starts_with("text/html"),
            None => {
                let head = String::from_utf8_lossy(&self.body[..self.body.len().min(512)]).to_ascii_lowercase();
                head.contains("<html") || head.contains("<!doctype html")
            }
        }
    }
}

/// Read-only transport used by discovery, entry loading and the admin source.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchResponse>;
    /// Existence check by status code only; the body is never read.
    async fn head(&self, url: &str) -> Result<u16>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(concat!("gameshelf/", env!("CARGO_PKG_VERSION")));
        if let Some(t) = timeout { builder = builder.timeout(t); }
        Ok(Self { client: builder.build()? })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        let resp = self.client.get(url).send().await.with_context(|| format!("GET {url}"))?;
        read_response(resp, url).await
    }

    async fn head(&self, url: &str) -> Result<u16> {
        let resp = self.client.head(url).send().await.with_context(|| format!("HEAD {url}"))?;
        Ok(resp.status().as_u16())
    }
}

pub(crate) async fn read_response(resp: reqwest::Response, url: &str) -> Result<FetchResponse> {
    let status = resp.status().as_u16();
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = resp.bytes().await.with_context(|| format!("reading body of {url}"))?.to_vec();
    Ok(FetchResponse { status, content_type, body })
}

/// In-memory fetcher keyed by absolute URL. Unknown URLs answer 404;
/// URLs registered with [`MemoryFetcher::fail`] produce a transport error.
#[derive(Default)]
pub struct MemoryFetcher {
    routes: Mutex<HashMap<String, FetchResponse>>,
    broken: Mutex<Vec<String>>,
    log: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, url: &str, status: u16, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> &Self {
        let resp = FetchResponse { status, content_type: content_type.map(str::to_string), body: body.into() };
        self.routes.lock().unwrap_or_else(|e| e.into_inner()).insert(url.to_string(), resp);
        self
    }

    pub fn json(&self, url: &str, body: &str) -> &Self { self.insert(url, 200, Some("application/json"), body) }
    pub fn text(&self, url: &str, body: &str) -> &Self { self.insert(url, 200, Some("text/plain"), body) }
    pub fn html(&self, url: &str, body: &str) -> &Self { self.insert(url, 200, Some("text/html; charset=utf-8"), body) }
    pub fn bytes(&self, url: &str, body: &[u8]) -> &Self { self.insert(url, 200, Some("image/png"), body.to_vec()) }

    pub fn fail(&self, url: &str) -> &Self {
        self.broken.lock().unwrap_or_else(|e| e.into_inner()).push(url.to_string());
        self
    }

    /// Every URL requested so far, in order, prefixed with the method.
    pub fn requests(&self) -> Vec<String> { self.log.lock().unwrap_or_else(|e| e.into_inner()).clone() }

    fn lookup(&self, method: &str, url: &str) -> Result<FetchResponse> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).push(format!("{method} {url}"));
        if self.broken.lock().unwrap_or_else(|e| e.into_inner()).iter().any(|u| u == url) {
            anyhow::bail!("connection refused: {url}");
        }
        let routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        Ok(routes.get(url).cloned().unwrap_or(FetchResponse { status: 404, content_type: None, body: Vec::new() }))
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse> { self.lookup("GET", url) }
    async fn head(&self, url: &str) -> Result<u16> { Ok(self.lookup("HEAD", url)?.status) }
}

/// Join a relative path onto a base location without doubling slashes.
pub fn join(base: &str, rel: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), rel.trim_start_matches('/'))
}
