use anyhow::{bail, Result};
use base64::Engine as _;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ShelfConfig;
use crate::discovery::{DirectoryIndexScrape, Discovery, IndexFileProbe, ManifestProbe};
use crate::fetch::{join, Fetcher};
use crate::mapping::record_from_package;
use crate::types::{GameRecord, GamesDocument, PackageMetadata};

/// Working list for the admin editor: folder scan first, then the
/// `{ "games": [...] }` document. Both empty is a valid, empty result.
pub async fn load_admin_records(fetcher: &dyn Fetcher, cfg: &ShelfConfig) -> Result<Vec<GameRecord>> {
    let discovery = Discovery::new(cfg.resolved_admin_bases()?)
        .with_strategy(ManifestProbe::new(&cfg.manifest_file))
        .with_strategy(IndexFileProbe::new(&cfg.index_file))
        .with_strategy(DirectoryIndexScrape);
    let outcome = discovery.run(fetcher).await;

    let mut records = Vec::new();
    if let Some(base) = &outcome.base {
        for id in &outcome.ids {
            match load_package(fetcher, base, id, cfg).await {
                Ok(r) => records.push(r),
                Err(e) => warn!(id = id.as_str(), error = %e, "skipping package"),
            }
        }
    }
    if !records.is_empty() {
        info!(count = records.len(), "loaded games from folders");
        return Ok(records);
    }

    let url = cfg.resolve(&cfg.admin.fallback_document)?;
    match fetch_document(fetcher, &url).await {
        Ok(doc) => {
            info!(count = doc.games.len(), url = url.as_str(), "loaded games from document");
            Ok(doc.games)
        }
        Err(e) => {
            debug!(url = url.as_str(), error = %e, "no games document");
            Ok(Vec::new())
        }
    }
}

async fn load_package(fetcher: &dyn Fetcher, base: &str, id: &str, cfg: &ShelfConfig) -> Result<GameRecord> {
    let folder = join(base, id);
    let url = join(&folder, &cfg.admin.package_file);
    let resp = fetcher.get(&url).await?;
    if !resp.is_success() { bail!("{url} answered {}", resp.status); }
    let raw: Value = resp.json()?;
    let Some(pkg) = PackageMetadata::from_value(&raw) else { bail!("{url} is not a JSON object") };
    let image = embed_image(fetcher, &join(&folder, &cfg.admin.cover_file)).await;
    Ok(record_from_package(id, pkg, image))
}

/// Cover bytes as a `data:` URL; any failure just means no image.
async fn embed_image(fetcher: &dyn Fetcher, url: &str) -> Option<String> {
    let resp = fetcher.get(url).await.ok().filter(|r| r.is_success() && !r.body.is_empty())?;
    let mime = resp.content_type.as_deref().filter(|ct| ct.starts_with("image/")).unwrap_or("image/png");
    Some(format!("data:{};base64,{}", mime, base64::engine::general_purpose::STANDARD.encode(&resp.body)))
}

async fn fetch_document(fetcher: &dyn Fetcher, url: &str) -> Result<GamesDocument> {
    let resp = fetcher.get(url).await?;
    if !resp.is_success() { bail!("{url} answered {}", resp.status); }
    let raw: Value = resp.json()?;
    let doc = GamesDocument::from_value(&raw);
    let listed = raw.get("games").and_then(Value::as_array).map_or(0, Vec::len);
    if listed > doc.games.len() {
        warn!(url, skipped = listed - doc.games.len(), "dropped games without an id");
    }
    Ok(doc)
}
