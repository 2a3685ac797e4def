//! Identifier discovery under unknown hosting conditions.
//!
//! Each strategy answers "which entry folders exist?" in its own way. The
//! [`Discovery`] coordinator tries them in priority order and keeps the first
//! non-empty answer. A failing strategy is never fatal.

use anyhow::{bail, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::{debug, info};
use url::Url;

use crate::config::{RepositoryConfig, ShelfConfig};
use crate::fetch::{join, Fetcher};

#[async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the result depends on the base candidate. Strategies that
    /// don't are attempted once.
    fn base_relative(&self) -> bool { true }

    /// `Ok(None)` and `Ok(Some(empty))` both mean "nothing here".
    async fn attempt(&self, fetcher: &dyn Fetcher, base: &str) -> Result<Option<Vec<String>>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    /// Base that produced the identifiers; fixed for the rest of the run.
    pub base: Option<String>,
    pub ids: Vec<String>,
    pub strategy: Option<&'static str>,
}

impl DiscoveryOutcome {
    pub fn is_empty(&self) -> bool { self.ids.is_empty() }
}

pub struct Discovery {
    bases: Vec<String>,
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
}

impl Discovery {
    pub fn new(bases: Vec<String>) -> Self { Self { bases, strategies: Vec::new() } }

    pub fn with_strategy(mut self, strategy: impl DiscoveryStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Canonical order: manifest, index file, repository listing,
    /// directory-index scrape, fallback list.
    pub fn from_config(cfg: &ShelfConfig) -> Result<Self> {
        let mut d = Self::new(cfg.resolved_bases()?)
            .with_strategy(ManifestProbe::new(&cfg.manifest_file))
            .with_strategy(IndexFileProbe::new(&cfg.index_file));
        if let Some(repo) = &cfg.repository {
            d = d.with_strategy(RepositoryListing::new(repo.clone()));
        }
        Ok(d.with_strategy(DirectoryIndexScrape).with_strategy(FallbackList::new(cfg.fallback_ids.clone())))
    }

    pub fn bases(&self) -> &[String] { &self.bases }
    pub fn strategy_names(&self) -> Vec<&'static str> { self.strategies.iter().map(|s| s.name()).collect() }

    pub async fn run(&self, fetcher: &dyn Fetcher) -> DiscoveryOutcome {
        let Some(first) = self.bases.first().map(String::as_str) else {
            info!("no base candidates to probe");
            return DiscoveryOutcome { base: None, ids: Vec::new(), strategy: None };
        };
        for strategy in &self.strategies {
            let candidates: Vec<&str> = if strategy.base_relative() {
                self.bases.iter().map(String::as_str).collect()
            } else {
                vec![first]
            };
            for base in candidates {
                match strategy.attempt(fetcher, base).await {
                    Ok(Some(ids)) if !ids.is_empty() => {
                        info!(strategy = strategy.name(), base, count = ids.len(), "discovered entries");
                        return DiscoveryOutcome { base: Some(base.to_string()), ids, strategy: Some(strategy.name()) };
                    }
                    Ok(_) => debug!(strategy = strategy.name(), base, "no entries"),
                    Err(e) => debug!(strategy = strategy.name(), base, error = %e, "strategy failed"),
                }
            }
        }
        info!("no entries discovered");
        DiscoveryOutcome { base: None, ids: Vec::new(), strategy: None }
    }
}

/// `<base>/games.json` holding a JSON array of strings.
pub struct ManifestProbe {
    file: String,
}

impl ManifestProbe {
    pub fn new(file: &str) -> Self { Self { file: file.to_string() } }
}

#[async_trait]
impl DiscoveryStrategy for ManifestProbe {
    fn name(&self) -> &'static str { "manifest" }

    async fn attempt(&self, fetcher: &dyn Fetcher, base: &str) -> Result<Option<Vec<String>>> {
        let resp = fetcher.get(&join(base, &self.file)).await?;
        if !resp.is_success() { return Ok(None); }
        let ids: Vec<String> = resp.json()?;
        Ok(Some(ids))
    }
}

/// Plain text, one identifier per line.
pub struct IndexFileProbe {
    file: String,
}

impl IndexFileProbe {
    pub fn new(file: &str) -> Self { Self { file: file.to_string() } }
}

#[async_trait]
impl DiscoveryStrategy for IndexFileProbe {
    fn name(&self) -> &'static str { "index-file" }

    async fn attempt(&self, fetcher: &dyn Fetcher, base: &str) -> Result<Option<Vec<String>>> {
        let resp = fetcher.get(&join(base, &self.file)).await?;
        // catch-all hosts answer missing files with their index page
        if !resp.is_success() || resp.is_html() { return Ok(None); }
        Ok(Some(parse_index(&resp.text()?)))
    }
}

pub fn parse_index(text: &str) -> Vec<String> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect()
}

#[derive(Deserialize)]
struct RepoItem {
    #[serde(rename = "type")]
    kind: String,
    name: String,
}

/// GitHub contents API listing of the entries directory.
pub struct RepositoryListing {
    repo: RepositoryConfig,
}

impl RepositoryListing {
    pub fn new(repo: RepositoryConfig) -> Self { Self { repo } }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.repo.api_base.trim_end_matches('/'),
            self.repo.owner,
            self.repo.repo,
            self.repo.dir.trim_matches('/')
        )
    }
}

#[async_trait]
impl DiscoveryStrategy for RepositoryListing {
    fn name(&self) -> &'static str { "repository" }
    fn base_relative(&self) -> bool { false }

    async fn attempt(&self, fetcher: &dyn Fetcher, _base: &str) -> Result<Option<Vec<String>>> {
        let url = self.endpoint();
        let resp = fetcher.get(&url).await?;
        if !resp.is_success() { bail!("{url} answered {}", resp.status); }
        let items: Vec<RepoItem> = resp.json()?;
        Ok(Some(items.into_iter().filter(|i| i.kind == "dir").map(|i| i.name).collect()))
    }
}

/// Parses a server-generated directory listing page.
pub struct DirectoryIndexScrape;

#[async_trait]
impl DiscoveryStrategy for DirectoryIndexScrape {
    fn name(&self) -> &'static str { "directory-index" }

    async fn attempt(&self, fetcher: &dyn Fetcher, base: &str) -> Result<Option<Vec<String>>> {
        let url = format!("{}/", base.trim_end_matches('/'));
        let resp = fetcher.get(&url).await?;
        if !resp.is_success() || !resp.is_html() { return Ok(None); }
        Ok(Some(parse_listing(&resp.text()?, &url)))
    }
}

static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<a\s[^>]*?href\s*=\s*["']([^"']+)["']"#).expect("static href pattern"));

/// Folder names linked from a listing page located at `page_url`. Links are
/// resolved against the page; only direct children without a dot survive.
pub fn parse_listing(html: &str, page_url: &str) -> Vec<String> {
    let Ok(page) = Url::parse(page_url) else { return Vec::new(); };
    let mut out = Vec::new();
    for cap in HREF.captures_iter(html) {
        let href = cap[1].trim();
        if href.starts_with('?') || href.starts_with('#') { continue; }
        let Ok(target) = page.join(href) else { continue; };
        if target.origin() != page.origin() || target.query().is_some() { continue; }
        let Some(rest) = target.path().strip_prefix(page.path()) else { continue; };
        let id = rest.trim_end_matches('/');
        if id.is_empty() || id.contains('/') || id.contains('.') { continue; }
        out.push(id.to_string());
    }
    out
}

/// Known-good identifiers used when every probe comes back empty.
pub struct FallbackList {
    ids: Vec<String>,
}

impl FallbackList {
    pub fn new(ids: Vec<String>) -> Self { Self { ids } }
}

#[async_trait]
impl DiscoveryStrategy for FallbackList {
    fn name(&self) -> &'static str { "fallback" }
    fn base_relative(&self) -> bool { false }

    async fn attempt(&self, _fetcher: &dyn Fetcher, _base: &str) -> Result<Option<Vec<String>>> {
        Ok(Some(self.ids.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_drops_blank_lines() {
        assert_eq!(parse_index("a\n\nb\n"), vec!["a", "b"]);
        assert_eq!(parse_index("  a \r\n\t\r\n b"), vec!["a", "b"]);
    }

    #[test]
    fn listing_skips_navigation_and_files() {
        let html = r#"<html><body><h1>Index of /games/</h1>
            <a href="?C=N;O=D">Name</a>
            <a href="../">Parent Directory</a>
            <a href="./">.</a>
            <a href="/">root</a>
            <a href="mario/">mario/</a>
            <a HREF='/games/zelda/'>zelda/</a>
            <a href="games.json">games.json</a>
            <a href="https://elsewhere.org/pong/">pong</a>
            <a href="metroid/saves/">nested</a>
            </body></html>"#;
        assert_eq!(parse_listing(html, "http://host/games/"), vec!["mario", "zelda"]);
    }

    #[test]
    fn repository_endpoint_shape() {
        let s = RepositoryListing::new(RepositoryConfig {
            owner: "acme".into(),
            repo: "arcade".into(),
            dir: "/games/".into(),
            api_base: "https://api.github.com/".into(),
        });
        assert_eq!(s.endpoint(), "https://api.github.com/repos/acme/arcade/contents/games");
    }
}
