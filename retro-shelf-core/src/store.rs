//! Per-collection metadata sidecar (`gamelist.json`).
//!
//! Keyed by ROM file name so entries survive a rescan. Written atomically
//! through a temp file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LibraryError;
use crate::game::{Collection, GameRef};
use crate::metadata::Metadata;

pub const GAMELIST_FILE: &str = "gamelist.json";
const GAMELIST_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct GameList {
    version: u32,
    saved_at: String,
    games: BTreeMap<String, Metadata>,
}

/// Path of the sidecar for a collection folder.
pub fn gamelist_path(collection_dir: &Path) -> PathBuf {
    collection_dir.join(GAMELIST_FILE)
}

/// Load the metadata sidecar of a collection folder.
///
/// A missing file is an empty map. A file written by a newer version is
/// ignored with a warning rather than half-parsed.
pub fn load_gamelist(collection_dir: &Path) -> Result<BTreeMap<String, Metadata>, LibraryError> {
    let path = gamelist_path(collection_dir);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };
    let list: GameList =
        serde_json::from_str(&content).map_err(|source| LibraryError::Json {
            path: path.clone(),
            source,
        })?;
    if list.version > GAMELIST_VERSION {
        log::warn!(
            "Ignoring {} (version {} is newer than {})",
            path.display(),
            list.version,
            GAMELIST_VERSION
        );
        return Ok(BTreeMap::new());
    }
    Ok(list.games)
}

/// Save the metadata of `games` into the collection's sidecar.
pub fn save_gamelist(collection: &Collection, games: &[GameRef]) -> Result<PathBuf, LibraryError> {
    if collection.read_only() {
        return Err(LibraryError::ReadOnly(collection.name().to_string()));
    }

    let games = games
        .iter()
        .filter(|g| !g.metadata().is_blank())
        .map(|g| (g.file_name().to_string(), g.metadata().clone()))
        .collect();
    let list = GameList {
        version: GAMELIST_VERSION,
        saved_at: chrono::Utc::now().to_rfc3339(),
        games,
    };

    let path = gamelist_path(collection.path());
    let json = serde_json::to_string_pretty(&list).map_err(|source| LibraryError::Json {
        path: path.clone(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, &path)?;
    Ok(path)
}
