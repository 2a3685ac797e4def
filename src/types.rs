use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_DESCRIPTION: &str = "No description available";
pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_DOWNLOAD_URL: &str = "#";
pub const DEFAULT_SIZE: &str = "Unknown";

/// Display record for one catalog card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub download_url: String,
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default)]
    pub coming_soon: bool,
}

/// Editable record owned by the admin editor. `image` carries an embedded
/// `data:` URL rather than a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub download_url: String,
    #[serde(default = "default_size")]
    pub size: String,
    #[serde(default)]
    pub coming_soon: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Wrapper shape of `data/games.json` and of locally persisted lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GamesDocument {
    #[serde(default)]
    pub games: Vec<GameRecord>,
}

/// `game/<id>/package.json`. Every key is optional on disk.
#[derive(Debug, Clone, Default)]
pub struct PackageMetadata {
    pub game_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub download_url: Option<String>,
    pub size: Option<String>,
    pub version: Option<String>,
    pub coming_soon: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total: usize,
    pub available: usize,
    pub coming_soon: usize,
}

impl CatalogStats {
    pub fn from_flags(flags: impl IntoIterator<Item = bool>) -> Self {
        let mut stats = Self::default();
        for coming_soon in flags {
            stats.total += 1;
            if coming_soon { stats.coming_soon += 1; } else { stats.available += 1; }
        }
        stats
    }
}

impl GameRecord {
    /// One element of a games document, coerced like catalog metadata.
    /// Non-objects and elements without an id yield `None`.
    pub fn from_value(v: &Value) -> Option<Self> {
        if !v.is_object() { return None; }
        let id = text_field(v, "id")?;
        Some(Self {
            name: text_field(v, "name").unwrap_or_else(|| id.clone()),
            id,
            description: text_field(v, "description").unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            version: text_field(v, "version").unwrap_or_else(default_version),
            download_url: text_field(v, "downloadUrl").unwrap_or_else(|| DEFAULT_DOWNLOAD_URL.to_string()),
            size: text_field(v, "size").unwrap_or_else(default_size),
            coming_soon: v.get("comingSoon").map(truthy).unwrap_or(false),
            image: text_field(v, "image"),
        })
    }
}

impl GamesDocument {
    /// Keeps every usable element of `games`; a bad element never costs the
    /// rest of the list.
    pub fn from_value(v: &Value) -> Self {
        let games = v
            .get("games")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(GameRecord::from_value).collect())
            .unwrap_or_default();
        Self { games }
    }
}

impl PackageMetadata {
    pub fn from_value(v: &Value) -> Option<Self> {
        if !v.is_object() { return None; }
        Some(Self {
            game_id: text_field(v, "gameId"),
            name: text_field(v, "name"),
            description: text_field(v, "description"),
            download_url: text_field(v, "downloadUrl"),
            size: text_field(v, "size"),
            version: text_field(v, "version"),
            coming_soon: v.get("comingSoon").map(truthy),
        })
    }
}

fn default_version() -> String { DEFAULT_VERSION.to_string() }
fn default_size() -> String { DEFAULT_SIZE.to_string() }

/// Build a display record from a parsed metadata document, applying the
/// per-field defaults. Returns `None` when the document is not an object.
pub fn normalize_entry(id: &str, meta: &Value, cover: Option<String>) -> Option<CatalogEntry> {
    if !meta.is_object() { return None; }
    Some(CatalogEntry {
        id: id.to_string(),
        name: text_field(meta, "name").unwrap_or_else(|| id.to_string()),
        description: text_field(meta, "description").unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        version: text_field(meta, "version").unwrap_or_else(default_version),
        download_url: text_field(meta, "downloadUrl").unwrap_or_else(|| DEFAULT_DOWNLOAD_URL.to_string()),
        size: text_field(meta, "size").unwrap_or_else(default_size),
        cover,
        coming_soon: meta.get("comingSoon").map(truthy).unwrap_or(false),
    })
}

/// Non-empty strings and non-zero numbers count as present; anything else
/// falls back to the default.
fn text_field(meta: &Value, key: &str) -> Option<String> {
    match meta.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_gets_every_default() {
        let e = normalize_entry("mario", &json!({}), None).unwrap();
        assert_eq!(e.name, "mario");
        assert_eq!(e.description, "No description available");
        assert_eq!(e.version, "1.0.0");
        assert_eq!(e.download_url, "#");
        assert_eq!(e.size, "Unknown");
        assert_eq!(e.cover, None);
        assert!(!e.coming_soon);
    }

    #[test]
    fn falsy_values_fall_back() {
        let meta = json!({ "name": "", "version": 0, "size": null, "comingSoon": "" });
        let e = normalize_entry("zelda", &meta, None).unwrap();
        assert_eq!(e.name, "zelda");
        assert_eq!(e.version, "1.0.0");
        assert_eq!(e.size, "Unknown");
        assert!(!e.coming_soon);
    }

    #[test]
    fn present_values_are_kept() {
        let meta = json!({
            "name": "Zelda", "description": "Adventure", "version": 2.5,
            "downloadUrl": "https://dl/zelda.zip", "size": "40 MB", "comingSoon": true
        });
        let e = normalize_entry("zelda", &meta, Some("c.png".into())).unwrap();
        assert_eq!(e.name, "Zelda");
        assert_eq!(e.version, "2.5");
        assert_eq!(e.download_url, "https://dl/zelda.zip");
        assert_eq!(e.cover.as_deref(), Some("c.png"));
        assert!(e.coming_soon);
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(normalize_entry("x", &json!(["a"]), None).is_none());
        assert!(normalize_entry("x", &json!("text"), None).is_none());
    }

    #[test]
    fn entry_serializes_camel_case_without_absent_cover() {
        let e = normalize_entry("a", &json!({}), None).unwrap();
        let v = serde_json::to_value(&e).unwrap();
        assert!(v.get("downloadUrl").is_some());
        assert!(v.get("comingSoon").is_some());
        assert!(v.get("cover").is_none());
    }

    #[test]
    fn incomplete_document_records_are_defaulted_not_dropped() {
        let doc = GamesDocument::from_value(&json!({ "games": [
            { "id": "pong", "name": "Pong", "description": "Bounce", "downloadUrl": "https://dl/pong" },
            { "id": "snake", "name": "Snake", "description": "S" },
            { "name": "no id" },
            "junk",
        ]}));
        assert_eq!(doc.games.len(), 2);
        assert_eq!(doc.games[1].id, "snake");
        assert_eq!(doc.games[1].download_url, "#");
        assert_eq!(doc.games[1].version, "1.0.0");
    }

    #[test]
    fn package_values_are_coerced_like_metadata() {
        let pkg = PackageMetadata::from_value(&json!({ "name": "Snake", "version": 1.2, "size": 40, "comingSoon": "true" })).unwrap();
        assert_eq!(pkg.version.as_deref(), Some("1.2"));
        assert_eq!(pkg.size.as_deref(), Some("40"));
        assert_eq!(pkg.coming_soon, Some(true));
        assert!(PackageMetadata::from_value(&json!([1, 2])).is_none());
    }

    #[test]
    fn stats_split_coming_soon() {
        let s = CatalogStats::from_flags([true, false, false]);
        assert_eq!(s, CatalogStats { total: 3, available: 2, coming_soon: 1 });
    }
}
