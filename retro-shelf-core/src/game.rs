use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::metadata::Metadata;
use crate::platform::Platform;

static NEXT_GAME_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Game`].
///
/// Two games with the same path and metadata are still different games;
/// anything that must track "this entry" keys on the id, not on content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameId(u64);

impl GameId {
    fn next() -> Self {
        Self(NEXT_GAME_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A system folder of the library (e.g. `roms/snes`).
#[derive(Debug)]
pub struct Collection {
    name: String,
    platform: Platform,
    path: PathBuf,
    read_only: bool,
}

impl Collection {
    pub fn new(
        name: impl Into<String>,
        platform: Platform,
        path: impl Into<PathBuf>,
        read_only: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            platform,
            path: path.into(),
            read_only,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Changes to games in a read-only collection must not be persisted,
    /// so nothing should scrape them either.
    pub fn read_only(&self) -> bool {
        self.read_only
    }
}

/// One library entry.
///
/// Shared as [`GameRef`] between the UI and scraping threads; metadata sits
/// behind a lock because engines fill it in from worker threads.
#[derive(Debug)]
pub struct Game {
    id: GameId,
    path: PathBuf,
    collection: Arc<Collection>,
    metadata: RwLock<Metadata>,
}

pub type GameRef = Arc<Game>;

impl Game {
    pub fn new(path: impl Into<PathBuf>, collection: Arc<Collection>, metadata: Metadata) -> GameRef {
        Arc::new(Self {
            id: GameId::next(),
            path: path.into(),
            collection,
            metadata: RwLock::new(metadata),
        })
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ROM file name with extension.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("?")
    }

    /// ROM file name without extension, used to name media files.
    pub fn rom_stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("?")
    }

    pub fn platform(&self) -> Platform {
        self.collection.platform()
    }

    /// The collection this game belongs to.
    pub fn top_ancestor(&self) -> &Collection {
        &self.collection
    }

    pub fn metadata(&self) -> RwLockReadGuard<'_, Metadata> {
        self.metadata.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn metadata_mut(&self) -> RwLockWriteGuard<'_, Metadata> {
        self.metadata.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Scraped name when known, file stem otherwise.
    pub fn display_name(&self) -> String {
        self.metadata()
            .name
            .clone()
            .unwrap_or_else(|| self.rom_stem().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snes() -> Arc<Collection> {
        Collection::new("snes", Platform::Snes, "/roms/snes", false)
    }

    #[test]
    fn identity_is_per_instance_not_per_value() {
        let collection = snes();
        let a = Game::new("/roms/snes/Zelda.sfc", collection.clone(), Metadata::default());
        let b = Game::new("/roms/snes/Zelda.sfc", collection, Metadata::default());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn names_come_from_the_path_until_scraped() {
        let game = Game::new("/roms/snes/Super Metroid (USA).sfc", snes(), Metadata::default());
        assert_eq!(game.file_name(), "Super Metroid (USA).sfc");
        assert_eq!(game.rom_stem(), "Super Metroid (USA)");
        assert_eq!(game.display_name(), "Super Metroid (USA)");

        game.metadata_mut().name = Some("Super Metroid".into());
        assert_eq!(game.display_name(), "Super Metroid");
    }

    #[test]
    fn top_ancestor_reports_read_only() {
        let ro = Collection::new("snes", Platform::Snes, "/ro/snes", true);
        let game = Game::new("/ro/snes/a.sfc", ro, Metadata::default());
        assert!(game.top_ancestor().read_only());
        assert_eq!(game.platform(), Platform::Snes);
    }
}
