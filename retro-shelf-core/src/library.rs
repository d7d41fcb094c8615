//! Library scanning.
//!
//! A library root holds one folder per system (`snes/`, `megadrive/`, ...).
//! Each recognised folder becomes a [`Collection`] and every ROM file in it
//! a [`Game`], seeded with whatever the collection's sidecar remembers.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::LibraryError;
use crate::game::{Collection, Game, GameRef};
use crate::platform::Platform;
use crate::store;

/// Marker file that makes a collection read-only.
pub const READ_ONLY_MARKER: &str = ".readonly";

/// One scanned system folder.
#[derive(Debug)]
pub struct SystemCollection {
    pub collection: Arc<Collection>,
    pub games: Vec<GameRef>,
}

/// All scanned system folders under a root.
#[derive(Debug, Default)]
pub struct Library {
    pub root: PathBuf,
    pub systems: Vec<SystemCollection>,
}

impl Library {
    /// Every game of every system, in scan order.
    pub fn games(&self) -> impl Iterator<Item = &GameRef> {
        self.systems.iter().flat_map(|s| s.games.iter())
    }

    pub fn game_count(&self) -> usize {
        self.systems.iter().map(|s| s.games.len()).sum()
    }
}

/// Scan a library root.
///
/// Folders whose name is not a known system are skipped. When `only` is
/// given, only those systems are scanned.
pub fn scan_library(root: &Path, only: Option<&[Platform]>) -> Result<Library, LibraryError> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(root)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    let mut systems = Vec::new();
    for dir in dirs {
        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let platform: Platform = match name.parse() {
            Ok(p) => p,
            Err(_) => {
                log::debug!("Skipping non-system folder {}", dir.display());
                continue;
            }
        };
        if only.is_some_and(|wanted| !wanted.contains(&platform)) {
            continue;
        }
        systems.push(scan_collection(&dir, platform)?);
    }

    Ok(Library {
        root: root.to_path_buf(),
        systems,
    })
}

/// Scan one system folder.
pub fn scan_collection(dir: &Path, platform: Platform) -> Result<SystemCollection, LibraryError> {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LibraryError::UnknownSystem(dir.display().to_string()))?;
    let collection = Collection::new(name, platform, dir, is_read_only(dir));

    let extensions: HashSet<&str> = platform.extensions().iter().copied().collect();
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_extension(p, &extensions))
        .collect();
    files.sort();
    drop_cue_data_tracks(&mut files);

    let mut known = store::load_gamelist(dir)?;
    let games = files
        .into_iter()
        .map(|path| {
            let metadata = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| known.remove(n))
                .unwrap_or_default();
            Game::new(path, collection.clone(), metadata)
        })
        .collect::<Vec<_>>();

    log::debug!(
        "Scanned {}: {} games{}",
        dir.display(),
        games.len(),
        if collection.read_only() { " (read-only)" } else { "" }
    );
    Ok(SystemCollection { collection, games })
}

fn is_read_only(dir: &Path) -> bool {
    dir.join(READ_ONLY_MARKER).exists()
        || dir
            .metadata()
            .map(|m| m.permissions().readonly())
            .unwrap_or(false)
}

fn has_extension(path: &Path, extensions: &HashSet<&str>) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.contains(e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Remove `.bin`/`.img`/`.iso` tracks that belong to a `.cue` sheet.
fn drop_cue_data_tracks(files: &mut Vec<PathBuf>) {
    let cue_stems: HashSet<String> = files
        .iter()
        .filter(|p| ext_lower(p) == "cue")
        .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_lowercase))
        .collect();
    if cue_stems.is_empty() {
        return;
    }
    files.retain(|p| {
        if !matches!(ext_lower(p).as_str(), "bin" | "img" | "iso") {
            return true;
        }
        let stem = p
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        !cue_stems.contains(&stem)
    });
}

fn ext_lower(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "tests/library_tests.rs"]
mod tests;
