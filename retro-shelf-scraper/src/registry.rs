use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use retro_shelf_core::{GameId, GameRef};

use crate::engine::ScrapingStageCallback;

/// A game that has been accepted for scraping and not yet completed.
#[derive(Clone)]
pub struct PendingEntry {
    pub game: GameRef,
    pub started: Instant,
    pub caller: Weak<dyn ScrapingStageCallback>,
}

impl PendingEntry {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The caller, if it is still alive.
    pub fn callback(&self) -> Option<Arc<dyn ScrapingStageCallback>> {
        self.caller.upgrade()
    }
}

impl std::fmt::Debug for PendingEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingEntry")
            .field("game", &self.game.id())
            .field("started", &self.started)
            .field("caller_alive", &(self.caller.strong_count() > 0))
            .finish()
    }
}

/// Games currently in flight, keyed by identity. At most one entry per game.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    entries: Mutex<HashMap<GameId, PendingEntry>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `game` unless it is already in flight.
    pub fn try_insert(&self, game: &GameRef, caller: &Arc<dyn ScrapingStageCallback>) -> bool {
        self.try_insert_if(game, caller, |_| true)
    }

    /// Register `game` if it is not in flight and `gate` accepts it. The
    /// gate runs under the registry lock, so concurrent callers cannot both
    /// pass it for the same game.
    pub fn try_insert_if(
        &self,
        game: &GameRef,
        caller: &Arc<dyn ScrapingStageCallback>,
        gate: impl FnOnce(&GameRef) -> bool,
    ) -> bool {
        let mut entries = self.lock();
        if entries.contains_key(&game.id()) || !gate(game) {
            return false;
        }
        entries.insert(
            game.id(),
            PendingEntry {
                game: game.clone(),
                started: Instant::now(),
                caller: Arc::downgrade(caller),
            },
        );
        true
    }

    /// Look up an entry, erasing it when `remove` is set.
    pub fn pop(&self, id: GameId, remove: bool) -> Option<PendingEntry> {
        let mut entries = self.lock();
        let entry = if remove {
            entries.remove(&id)
        } else {
            entries.get(&id).cloned()
        };
        if entry.is_none() {
            log::error!("Game {} is not registered as being scraped", id);
        }
        entry
    }

    /// Drop an entry without delivering anything. A miss is not an error.
    pub fn remove(&self, id: GameId) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn contains(&self, id: GameId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<GameId, PendingEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
