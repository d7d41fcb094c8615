//! Seamless background scraping with ScreenScraper.
//!
//! [`SeamlessScraper`] is the entry point: push games from the UI thread,
//! call [`SeamlessScraper::process_messages`] once per frame, and receive
//! stage callbacks there.

pub mod client;
pub mod config;
pub mod engine;
pub mod engine_pool;
pub mod error;
pub mod lookup;
pub mod media;
pub mod notifier;
pub mod protected_set;
pub mod registry;
pub mod screenscraper;
pub mod seamless;
pub mod systems;
pub mod types;
pub mod worker_pool;

pub use client::ScreenScraperClient;
pub use config::{
    ConfigSource, CredentialSources, Credentials, ScraperSettings, config_path, credential_sources,
};
pub use engine::{ScrapeEngine, ScrapeMessage, ScrapingMethod, ScrapingStageCallback, Stage, StageSink};
pub use engine_pool::{EngineLease, EnginePool};
pub use error::ScrapeError;
pub use lookup::{LookupMethod, LookupResult, RomInfo};
pub use media::{MediaSelection, MediaType};
pub use notifier::{Notifier, NotifierSender};
pub use protected_set::ProtectedSet;
pub use registry::{InFlightRegistry, PendingEntry};
pub use screenscraper::ScreenScraperEngine;
pub use seamless::{SeamlessScraper, SeamlessSettings};
pub use systems::screenscraper_system_id;
pub use worker_pool::{JobHandler, WorkerPool};
