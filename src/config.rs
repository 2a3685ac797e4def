use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Remote repository whose contents API lists entry folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub owner: String,
    pub repo: String,
    /// Directory inside the repository holding one folder per entry.
    #[serde(default = "default_repo_dir")]
    pub dir: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfConfig {
    /// Location the relative base candidates are resolved against.
    pub root_url: String,
    /// Relative prefixes where the content root may live, tried in order.
    pub base_candidates: Vec<String>,
    pub manifest_file: String,
    pub index_file: String,
    pub metadata_file: String,
    pub cover_file: String,
    /// Shared placeholder images, relative to `root_url`.
    pub cover_placeholders: Vec<String>,
    pub fallback_ids: Vec<String>,
    pub repository: Option<RepositoryConfig>,
    pub admin: AdminConfig,
    /// No timeout unless set.
    pub timeout_secs: Option<u64>,
}

/// Folder-based source format used by the admin editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub base_candidates: Vec<String>,
    pub package_file: String,
    pub cover_file: String,
    /// `{ "games": [...] }` document used when the folder scan finds nothing.
    pub fallback_document: String,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            root_url: "http://localhost:8000/".to_string(),
            base_candidates: vec!["games".into(), "../games".into(), "../../games".into()],
            manifest_file: "games.json".into(),
            index_file: "games.txt".into(),
            metadata_file: "github.json".into(),
            cover_file: "cover.png".into(),
            cover_placeholders: vec!["assets/placeholder.png".into(), "images/placeholder.png".into()],
            fallback_ids: vec!["snake".into(), "tetris".into(), "pong".into()],
            repository: None,
            admin: AdminConfig::default(),
            timeout_secs: None,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            base_candidates: vec!["game".into(), "../game".into()],
            package_file: "package.json".into(),
            cover_file: "Cover.png".into(),
            fallback_document: "data/games.json".into(),
        }
    }
}

fn default_repo_dir() -> String { "games".to_string() }
fn default_api_base() -> String { "https://api.github.com".to_string() }

impl ShelfConfig {
    /// Load from an explicit file, else the platform config dir, else defaults.
    /// Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };
        let mut cfg = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(&p).with_context(|| format!("reading config {}", p.display()))?;
                toml::from_str(&raw).with_context(|| format!("parsing config {}", p.display()))?
            }
            None => Self::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("GAMESHELF_ROOT_URL") { if !v.trim().is_empty() { self.root_url = v; } }
        if let Ok(v) = std::env::var("GAMESHELF_METADATA_FILE") { if !v.trim().is_empty() { self.metadata_file = v; } }
        if let Some(secs) = std::env::var("GAMESHELF_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()) { self.timeout_secs = Some(secs); }
        // owner/repo[/dir]
        if let Ok(v) = std::env::var("GAMESHELF_REPO") {
            let parts: Vec<&str> = v.trim().splitn(3, '/').collect();
            if parts.len() >= 2 && !parts[0].is_empty() && !parts[1].is_empty() {
                self.repository = Some(RepositoryConfig {
                    owner: parts[0].to_string(),
                    repo: parts[1].to_string(),
                    dir: parts.get(2).map(|s| s.to_string()).unwrap_or_else(default_repo_dir),
                    api_base: default_api_base(),
                });
            }
        }
    }

    pub fn timeout(&self) -> Option<Duration> { self.timeout_secs.map(Duration::from_secs) }

    pub fn root(&self) -> Result<Url> {
        let mut raw = self.root_url.trim().to_string();
        if !raw.ends_with('/') { raw.push('/'); }
        Url::parse(&raw).with_context(|| format!("invalid root url: {}", self.root_url))
    }

    /// Absolute URLs for the catalog's base candidates.
    pub fn resolved_bases(&self) -> Result<Vec<String>> { resolve_all(&self.root()?, &self.base_candidates) }

    pub fn resolved_admin_bases(&self) -> Result<Vec<String>> { resolve_all(&self.root()?, &self.admin.base_candidates) }

    pub fn resolve(&self, rel: &str) -> Result<String> {
        Ok(self.root()?.join(rel).with_context(|| format!("joining {rel} onto root"))?.to_string())
    }
}

fn resolve_all(root: &Url, rels: &[String]) -> Result<Vec<String>> {
    if rels.is_empty() { bail!("no base candidates configured"); }
    rels.iter()
        .map(|r| {
            let joined = root.join(r).with_context(|| format!("joining {r} onto {root}"))?;
            Ok(joined.as_str().trim_end_matches('/').to_string())
        })
        .collect()
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "gameshelf", "gameshelf").map(|p| p.config_dir().join("gameshelf.toml"))
}
