//! Background scraping of games as they come into view.
//!
//! The host pushes games from its UI thread. Each accepted game is queued
//! for a worker, which leases an engine, scrapes, and reports stages back
//! through a channel. The host calls [`SeamlessScraper::process_messages`]
//! once per frame; stage callbacks run there, on the host's thread.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use retro_shelf_core::{GameRef, MetadataChanges};

use crate::config::ScraperSettings;
use crate::engine::{
    ScrapeEngine, ScrapeMessage, ScrapingMethod, ScrapingStageCallback, Stage, StageSink,
};
use crate::engine_pool::EnginePool;
use crate::error::ScrapeError;
use crate::notifier::{Notifier, NotifierSender};
use crate::protected_set::ProtectedSet;
use crate::registry::InFlightRegistry;
use crate::worker_pool::{JobHandler, WorkerPool};

/// Games scraped less than this many days ago are left alone.
pub const RESCRAPE_AFTER_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct SeamlessSettings {
    pub auto_scrape: bool,
    pub method: ScrapingMethod,
}

impl Default for SeamlessSettings {
    fn default() -> Self {
        Self {
            auto_scrape: true,
            method: ScrapingMethod::CompleteAndKeepExisting,
        }
    }
}

impl From<&ScraperSettings> for SeamlessSettings {
    fn from(settings: &ScraperSettings) -> Self {
        Self {
            auto_scrape: settings.auto_scrape,
            ..Self::default()
        }
    }
}

/// Worker-side state: engines, the shared protected set, and the way
/// back to the UI thread.
struct Dispatcher {
    engines: EnginePool<Box<dyn ScrapeEngine>>,
    protected: ProtectedSet,
    notifier: NotifierSender<ScrapeMessage>,
    method: ScrapingMethod,
}

/// Forwards intermediate stages of one game to the UI thread.
struct ForwardingSink<'a> {
    game: &'a GameRef,
    notifier: &'a NotifierSender<ScrapeMessage>,
}

impl StageSink for ForwardingSink<'_> {
    fn stage_completed(&mut self, stage: Stage, changes: MetadataChanges) {
        if stage.is_terminal() {
            log::warn!("Engine reported {} for {}; ignored", stage, self.game.display_name());
            return;
        }
        self.notifier.send(ScrapeMessage {
            game: self.game.clone(),
            stage,
            changes,
        });
    }
}

impl JobHandler<GameRef> for Dispatcher {
    fn run_job(&self, game: GameRef) {
        let changes = match self.engines.allocate() {
            None => {
                log::warn!(
                    "No free scrape engine for {}; request dropped",
                    game.display_name()
                );
                MetadataChanges::empty()
            }
            Some(mut engine) => {
                log::debug!(
                    "Engine {} scraping {}",
                    engine.index(),
                    game.display_name()
                );
                let mut sink = ForwardingSink {
                    game: &game,
                    notifier: &self.notifier,
                };
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    engine.scrape(self.method, &game, &self.protected, &mut sink)
                }));
                drop(engine);

                match outcome {
                    Ok(Ok(changes)) => changes,
                    Ok(Err(e @ ScrapeError::NotFound { .. })) => {
                        log::debug!("{}: {}", game.display_name(), e);
                        MetadataChanges::empty()
                    }
                    Ok(Err(e)) => {
                        log::warn!("Scraping {} failed: {}", game.display_name(), e);
                        MetadataChanges::empty()
                    }
                    Err(_) => {
                        log::error!("Scrape engine panicked on {}", game.display_name());
                        MetadataChanges::empty()
                    }
                }
            }
        };

        self.notifier.send(ScrapeMessage {
            game,
            stage: Stage::Completed,
            changes,
        });
    }
}

/// Background scraper owned by the UI host.
///
/// At most one scrape per game is in flight. Every accepted push produces
/// zero or more intermediate stages followed by exactly one
/// [`Stage::Completed`], delivered in order by `process_messages` unless
/// the scraper is shut down first.
pub struct SeamlessScraper {
    settings: SeamlessSettings,
    registry: InFlightRegistry,
    notifier: Notifier<ScrapeMessage>,
    dispatcher: Arc<Dispatcher>,
    pool: WorkerPool<GameRef>,
    shutting_down: AtomicBool,
}

impl SeamlessScraper {
    /// Start one worker thread per engine.
    pub fn new(
        engines: Vec<Box<dyn ScrapeEngine>>,
        settings: SeamlessSettings,
    ) -> Result<Self, ScrapeError> {
        if engines.is_empty() {
            return Err(ScrapeError::NoEngines);
        }
        let workers = engines.len();
        let notifier = Notifier::new();
        let dispatcher = Arc::new(Dispatcher {
            engines: EnginePool::new(engines),
            protected: ProtectedSet::new(),
            notifier: notifier.sender(),
            method: settings.method,
        });
        let pool = WorkerPool::new("seamless-scraper", workers, dispatcher.clone())?;
        log::info!("Seamless scraper started with {} engines", workers);

        Ok(Self {
            settings,
            registry: InFlightRegistry::new(),
            notifier,
            dispatcher,
            pool,
            shutting_down: AtomicBool::new(false),
        })
    }

    /// Ask for `game` to be scraped in the background. Returns whether the
    /// request was accepted; games that are already pending, read-only,
    /// or recently scraped are ignored.
    pub fn push(&self, game: &GameRef, caller: &Arc<dyn ScrapingStageCallback>) -> bool {
        self.push_at(game, caller, Utc::now())
    }

    /// [`push`](Self::push) with an explicit current time.
    pub fn push_at(
        &self,
        game: &GameRef,
        caller: &Arc<dyn ScrapingStageCallback>,
        now: DateTime<Utc>,
    ) -> bool {
        if self.is_shut_down() {
            return false;
        }
        if !self
            .registry
            .try_insert_if(game, caller, |g| self.is_eligible(g, now))
        {
            return false;
        }
        if !self.pool.push(game.clone()) {
            // Lost a race with shutdown, which may have cleared it already.
            self.registry.remove(game.id());
            return false;
        }
        log::debug!("Queued {} for background scraping", game.display_name());
        true
    }

    /// Push every game in a list. Returns how many were accepted.
    pub fn push_all<'a>(
        &self,
        games: impl IntoIterator<Item = &'a GameRef>,
        caller: &Arc<dyn ScrapingStageCallback>,
    ) -> usize {
        games
            .into_iter()
            .filter(|game| self.push(game, caller))
            .count()
    }

    fn is_eligible(&self, game: &GameRef, now: DateTime<Utc>) -> bool {
        if !self.settings.auto_scrape || game.top_ancestor().read_only() {
            return false;
        }
        match game.metadata().timestamp {
            Some(last) => now - last >= TimeDelta::days(RESCRAPE_AFTER_DAYS),
            None => true,
        }
    }

    /// Deliver every stage message received so far to its caller, on this
    /// thread. Returns the number of messages drained.
    pub fn process_messages(&self) -> usize {
        self.notifier.drain(|message| {
            if self.is_shut_down() {
                return;
            }
            self.deliver(message);
        })
    }

    fn deliver(&self, message: ScrapeMessage) {
        let Some(entry) = self
            .registry
            .pop(message.game.id(), message.stage.is_terminal())
        else {
            return;
        };
        match entry.callback() {
            Some(callback) => {
                callback.scraping_stage_completed(&entry.game, message.stage, message.changes)
            }
            None => log::debug!(
                "Caller of {} is gone; {} stage not delivered",
                entry.game.display_name(),
                message.stage
            ),
        }
    }

    pub fn is_pending(&self, game: &GameRef) -> bool {
        self.registry.contains(game.id())
    }

    /// Games accepted and not yet completed.
    pub fn pending_count(&self) -> usize {
        self.registry.len()
    }

    /// Games waiting for a free worker.
    pub fn queued_count(&self) -> usize {
        self.pool.queued()
    }

    pub fn is_idle(&self) -> bool {
        self.registry.is_empty()
    }

    /// Keys recorded by engines during this run.
    pub fn protected(&self) -> &ProtectedSet {
        &self.dispatcher.protected
    }

    pub fn engine_count(&self) -> usize {
        self.dispatcher.engines.capacity()
    }

    fn is_shut_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Stop scraping. Queued games are abandoned, running scrapes are
    /// waited for, and no callback runs from now on.
    pub fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        log::debug!("Seamless scraper shutting down");
        self.pool.shutdown();
        self.registry.clear();
        let discarded = self.notifier.drain(drop);
        if discarded > 0 {
            log::debug!("Discarded {} undelivered scrape messages", discarded);
        }
    }
}

impl Drop for SeamlessScraper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "tests/seamless_tests.rs"]
mod tests;
