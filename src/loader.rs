use anyhow::{bail, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::fetch::{join, Fetcher};
use crate::types::{normalize_entry, CatalogEntry};

/// Where an entry's files live, fixed once discovery picked a base.
#[derive(Debug, Clone)]
pub struct EntryLayout {
    pub metadata_file: String,
    pub cover_file: String,
    /// Absolute URLs of shared placeholder images, probed after the
    /// entry-specific cover.
    pub placeholders: Vec<String>,
}

pub struct EntryLoader<'a> {
    fetcher: &'a dyn Fetcher,
    base: String,
    layout: EntryLayout,
}

impl<'a> EntryLoader<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, base: &str, layout: EntryLayout) -> Self {
        Self { fetcher, base: base.trim_end_matches('/').to_string(), layout }
    }

    /// One identifier in, at most one entry out. Failures are logged and
    /// reported as absence.
    pub async fn load(&self, id: &str) -> Option<CatalogEntry> {
        match self.try_load(id).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(id, error = %e, "skipping entry");
                None
            }
        }
    }

    /// Sequential, order-preserving; one bad entry never stops the batch.
    pub async fn load_all(&self, ids: &[String]) -> Vec<CatalogEntry> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entry) = self.load(id).await { out.push(entry); }
        }
        out
    }

    async fn try_load(&self, id: &str) -> Result<CatalogEntry> {
        let folder = join(&self.base, id);
        let url = join(&folder, &self.layout.metadata_file);
        let resp = self.fetcher.get(&url).await?;
        if !resp.is_success() { bail!("{url} answered {}", resp.status); }
        let meta: Value = resp.json()?;
        if !meta.is_object() { bail!("{url} is not a JSON object"); }
        let cover = self.resolve_cover(id).await;
        match normalize_entry(id, &meta, cover) {
            Some(entry) => Ok(entry),
            None => bail!("{url} could not be normalized"),
        }
    }

    pub fn cover_candidates(&self, id: &str) -> Vec<String> {
        let mut c = vec![join(&join(&self.base, id), &self.layout.cover_file)];
        c.extend(self.layout.placeholders.iter().cloned());
        c
    }

    /// First candidate answering with a success status, probed in order.
    async fn resolve_cover(&self, id: &str) -> Option<String> {
        for candidate in self.cover_candidates(id) {
            match self.fetcher.head(&candidate).await {
                Ok(status) if (200..300).contains(&status) => return Some(candidate),
                Ok(status) => debug!(candidate = candidate.as_str(), status, "cover candidate missing"),
                Err(e) => debug!(candidate = candidate.as_str(), error = %e, "cover probe failed"),
            }
        }
        None
    }
}
