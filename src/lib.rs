pub mod admin;
pub mod bridge;
pub mod config;
pub mod discovery;
pub mod editor;
pub mod fetch;
pub mod loader;
pub mod mapping;
pub mod types;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::bridge::{HostBridge, LocalBridge, PublishOutcome, PublishRequest, PublishTarget};
    pub use crate::config::ShelfConfig;
    pub use crate::discovery::{Discovery, DiscoveryOutcome, DiscoveryStrategy};
    pub use crate::editor::{DeleteOutcome, EditOutcome, EditorError, GameForm, MetadataEditor};
    pub use crate::fetch::{Fetcher, HttpFetcher, MemoryFetcher};
    pub use crate::types::{CatalogEntry, CatalogStats, GameRecord, GamesDocument};
    pub use crate::{Catalog, Gameshelf};
}

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::bridge::HostBridge;
use crate::config::ShelfConfig;
use crate::discovery::{Discovery, DiscoveryOutcome};
use crate::editor::MetadataEditor;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::loader::{EntryLayout, EntryLoader};
use crate::types::{CatalogEntry, CatalogStats, GameRecord};

/// Result of one discovery + load pass. Rebuilt from scratch every time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub base: Option<String>,
    pub strategy: Option<String>,
    pub entries: Vec<CatalogEntry>,
    pub stats: CatalogStats,
}

impl Catalog {
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

/// Library entry point. Owns the configuration and the transport.
pub struct Gameshelf {
    config: ShelfConfig,
    fetcher: Arc<dyn Fetcher>,
}

impl Gameshelf {
    /// Build with an HTTP transport honoring the configured timeout.
    pub fn new(config: ShelfConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(config.timeout())?);
        Ok(Self { config, fetcher })
    }

    pub fn with_fetcher(config: ShelfConfig, fetcher: Arc<dyn Fetcher>) -> Self { Self { config, fetcher } }

    pub fn config(&self) -> &ShelfConfig { &self.config }

    pub async fn discover(&self) -> Result<DiscoveryOutcome> {
        Ok(Discovery::from_config(&self.config)?.run(self.fetcher.as_ref()).await)
    }

    /// Discover identifiers, then load each one sequentially.
    pub async fn load_catalog(&self) -> Result<Catalog> {
        let outcome = self.discover().await?;
        let Some(base) = outcome.base.as_deref() else {
            return Ok(Catalog { base: None, strategy: None, entries: Vec::new(), stats: CatalogStats::default() });
        };
        let loader = EntryLoader::new(self.fetcher.as_ref(), base, self.entry_layout()?);
        let entries = loader.load_all(&outcome.ids).await;
        let stats = CatalogStats::from_flags(entries.iter().map(|e| e.coming_soon));
        Ok(Catalog { base: outcome.base.clone(), strategy: outcome.strategy.map(str::to_string), entries, stats })
    }

    pub fn entry_layout(&self) -> Result<EntryLayout> {
        let placeholders = self.config.cover_placeholders.iter().map(|p| self.config.resolve(p)).collect::<Result<Vec<_>>>()?;
        Ok(EntryLayout { metadata_file: self.config.metadata_file.clone(), cover_file: self.config.cover_file.clone(), placeholders })
    }

    pub async fn load_admin_records(&self) -> Result<Vec<GameRecord>> {
        admin::load_admin_records(self.fetcher.as_ref(), &self.config).await
    }

    /// Load the working list and hand it to an editor. A list the bridge
    /// already persisted wins over the published sources. Without a bridge
    /// the editor is read-only.
    pub async fn open_editor(&self, bridge: Option<Arc<dyn HostBridge>>) -> Result<MetadataEditor> {
        let stored = match &bridge {
            Some(b) => b.load_games().await?,
            None => None,
        };
        let records = match stored {
            Some(records) => {
                info!(count = records.len(), "resuming from persisted games");
                records
            }
            None => self.load_admin_records().await?,
        };
        Ok(MetadataEditor::new(records, bridge))
    }
}
