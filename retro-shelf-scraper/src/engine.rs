//! The scrape engine abstraction and the messages it produces.

use std::fmt;

use retro_shelf_core::{GameRef, Metadata, MetadataChanges};

use crate::error::ScrapeError;
use crate::protected_set::ProtectedSet;

/// Progress point of a single game's scrape.
///
/// Every scrape reports zero or more of the first four, in this order, and
/// always ends with exactly one `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Text,
    Images,
    Video,
    Extra,
    Completed,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Text => "text",
            Stage::Images => "images",
            Stage::Video => "video",
            Stage::Extra => "extra",
            Stage::Completed => "completed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which games are scraped and how fetched values merge into existing
/// metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapingMethod {
    /// Scrape every game and overwrite every field.
    All,
    /// Only scrape games that have no metadata at all.
    AllIfNothingExists,
    /// Fill empty fields, never touch existing values.
    CompleteAndKeepExisting,
    /// Fill every field, replacing existing values.
    CompleteAndReplaceExisting,
}

impl ScrapingMethod {
    /// Whether a game with this metadata needs scraping.
    pub fn applies_to(&self, metadata: &Metadata) -> bool {
        match self {
            ScrapingMethod::AllIfNothingExists => metadata.is_blank(),
            _ => true,
        }
    }

    /// Whether a fetched value replaces one that is already set.
    pub fn overwrites(&self) -> bool {
        matches!(
            self,
            ScrapingMethod::All | ScrapingMethod::CompleteAndReplaceExisting
        )
    }
}

/// Receives the intermediate stages of one scrape.
pub trait StageSink {
    fn stage_completed(&mut self, stage: Stage, changes: MetadataChanges);
}

/// Collects stages in memory.
impl StageSink for Vec<(Stage, MetadataChanges)> {
    fn stage_completed(&mut self, stage: Stage, changes: MetadataChanges) {
        self.push((stage, changes));
    }
}

/// Fetches metadata for one game at a time.
///
/// An engine owns one network session and is used by one thread at a time.
/// It writes into the game's metadata directly, reports `Text`, `Images`,
/// `Video` and `Extra` through `sink` as they finish, and returns the
/// union of all changes. It must not report `Completed`; the caller does.
pub trait ScrapeEngine: Send {
    fn scrape(
        &mut self,
        method: ScrapingMethod,
        game: &GameRef,
        protected: &ProtectedSet,
        sink: &mut dyn StageSink,
    ) -> Result<MetadataChanges, ScrapeError>;
}

/// Receiver of stage notifications on the UI thread.
pub trait ScrapingStageCallback: Send + Sync {
    fn scraping_stage_completed(&self, game: &GameRef, stage: Stage, changes: MetadataChanges);
}

/// A stage notification travelling from a worker to the UI thread.
#[derive(Debug, Clone)]
pub struct ScrapeMessage {
    pub game: GameRef,
    pub stage: Stage,
    pub changes: MetadataChanges,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_completed_is_terminal() {
        assert!(Stage::Completed.is_terminal());
        for stage in [Stage::Text, Stage::Images, Stage::Video, Stage::Extra] {
            assert!(!stage.is_terminal(), "{}", stage);
        }
    }

    #[test]
    fn methods_gate_and_merge() {
        let blank = Metadata::default();
        let named = Metadata {
            name: Some("Sonic".into()),
            ..Default::default()
        };
        assert!(ScrapingMethod::AllIfNothingExists.applies_to(&blank));
        assert!(!ScrapingMethod::AllIfNothingExists.applies_to(&named));
        assert!(ScrapingMethod::CompleteAndKeepExisting.applies_to(&named));

        assert!(ScrapingMethod::All.overwrites());
        assert!(ScrapingMethod::CompleteAndReplaceExisting.overwrites());
        assert!(!ScrapingMethod::CompleteAndKeepExisting.overwrites());
        assert!(!ScrapingMethod::AllIfNothingExists.overwrites());
    }
}
