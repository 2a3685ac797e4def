use crate::editor::GameForm;
use crate::types::{GameRecord, PackageMetadata, DEFAULT_DESCRIPTION, DEFAULT_DOWNLOAD_URL, DEFAULT_SIZE, DEFAULT_VERSION};

fn non_empty(v: Option<&str>) -> Option<String> {
    v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn or_default(v: &str, default: &str) -> String {
    non_empty(Some(v)).unwrap_or_else(|| default.to_string())
}

/// Folder-format `package.json` to an editable record. `gameId` wins over
/// the folder name when present.
pub fn record_from_package(folder: &str, pkg: PackageMetadata, image: Option<String>) -> GameRecord {
    let id = non_empty(pkg.game_id.as_deref()).unwrap_or_else(|| folder.to_string());
    GameRecord {
        name: non_empty(pkg.name.as_deref()).unwrap_or_else(|| id.clone()),
        id,
        description: non_empty(pkg.description.as_deref()).unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        version: non_empty(pkg.version.as_deref()).unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        download_url: non_empty(pkg.download_url.as_deref()).unwrap_or_else(|| DEFAULT_DOWNLOAD_URL.to_string()),
        size: non_empty(pkg.size.as_deref()).unwrap_or_else(|| DEFAULT_SIZE.to_string()),
        coming_soon: pkg.coming_soon.unwrap_or(false),
        image,
    }
}

pub fn form_from_record(r: &GameRecord) -> GameForm {
    GameForm {
        id: Some(r.id.clone()),
        name: r.name.clone(),
        description: r.description.clone(),
        version: r.version.clone(),
        download_url: r.download_url.clone(),
        size: r.size.clone(),
        coming_soon: r.coming_soon,
        image: r.image.clone(),
    }
}

pub fn record_from_form(id: &str, f: &GameForm) -> GameRecord {
    GameRecord {
        id: id.to_string(),
        name: f.name.trim().to_string(),
        description: f.description.trim().to_string(),
        version: or_default(&f.version, DEFAULT_VERSION),
        download_url: f.download_url.trim().to_string(),
        size: or_default(&f.size, DEFAULT_SIZE),
        coming_soon: f.coming_soon,
        image: f.image.clone().filter(|s| !s.is_empty()),
    }
}
