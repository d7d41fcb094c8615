use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use retro_shelf_core::{GameRef, Library, MetadataChanges, scan_library, store};
use retro_shelf_scraper::{
    Credentials, MediaSelection, ScrapeEngine, ScraperSettings, ScrapingStageCallback,
    ScreenScraperClient, ScreenScraperEngine, SeamlessScraper, SeamlessSettings, Stage,
};

use crate::cli_types::ScrapeArgs;
use crate::error::CliError;

/// Time between two message pumps, like a UI frame.
const FRAME: Duration = Duration::from_millis(50);

/// Stage callback of the CLI: counts results and drives the progress bar.
pub(crate) struct ScrapeTally {
    progress: ProgressBar,
    completed: AtomicUsize,
    updated: AtomicUsize,
}

impl ScrapeTally {
    pub(crate) fn new(progress: ProgressBar) -> Self {
        Self {
            progress,
            completed: AtomicUsize::new(0),
            updated: AtomicUsize::new(0),
        }
    }

    pub(crate) fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub(crate) fn updated(&self) -> usize {
        self.updated.load(Ordering::Relaxed)
    }
}

impl ScrapingStageCallback for ScrapeTally {
    fn scraping_stage_completed(&self, game: &GameRef, stage: Stage, changes: MetadataChanges) {
        if stage.is_terminal() {
            self.completed.fetch_add(1, Ordering::Relaxed);
            if !changes.is_empty() {
                self.updated.fetch_add(1, Ordering::Relaxed);
            }
            self.progress.inc(1);
            log::debug!("{}: done ({} fields)", game.display_name(), changes.bits().count_ones());
        } else {
            self.progress
                .set_message(format!("{} ({})", game.display_name(), stage));
        }
    }
}

/// Push `games` and pump messages every frame until the scraper is idle.
/// Returns how many games were accepted.
pub(crate) fn drive(
    scraper: &SeamlessScraper,
    games: &[GameRef],
    tally: &Arc<ScrapeTally>,
    frame: Duration,
) -> usize {
    let caller: Arc<dyn ScrapingStageCallback> = tally.clone();
    let accepted = scraper.push_all(games, &caller);
    tally.progress.set_length(accepted as u64);

    while !scraper.is_idle() {
        scraper.process_messages();
        std::thread::sleep(frame);
    }
    scraper.process_messages();
    accepted
}

fn select_games(library: &Library, limit: Option<usize>) -> Vec<GameRef> {
    library
        .systems
        .iter()
        .flat_map(|system| {
            let take = limit.unwrap_or(usize::MAX);
            system.games.iter().take(take).cloned()
        })
        .collect()
}

fn connect(settings: &ScraperSettings, quiet: bool) -> Result<Vec<Box<dyn ScrapeEngine>>, CliError> {
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("/-\\|"));
        }
        pb.set_message("Connecting to ScreenScraper...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    let connected = Credentials::load().and_then(ScreenScraperClient::connect);
    pb.finish_and_clear();
    let (client, user) = connected?;

    let engines = settings.engines.min(user.max_threads()).max(1);
    log::info!(
        "{} Connected to ScreenScraper (requests today: {}/{}, using {} engines)",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        user.quota.requests_today(),
        user.quota.max_requests_per_day(),
        engines,
    );
    Ok(ScreenScraperEngine::sessions(client, settings, engines))
}

fn save_sidecars(library: &Library) -> usize {
    let mut saved = 0;
    for system in &library.systems {
        if system.collection.read_only() {
            continue;
        }
        match store::save_gamelist(&system.collection, &system.games) {
            Ok(path) => {
                log::debug!("Saved {}", path.display());
                saved += 1;
            }
            Err(e) => log::warn!("Could not save {} metadata: {}", system.collection.name(), e),
        }
    }
    saved
}

/// Run the scrape command.
pub(crate) fn run_scrape(root: &Path, args: ScrapeArgs, quiet: bool) -> Result<(), CliError> {
    let mut settings = ScraperSettings::load()?;
    if let Some(threads) = args.threads {
        settings.engines = threads.clamp(1, retro_shelf_scraper::config::MAX_ENGINES);
    }
    if let Some(region) = args.region {
        settings.region = region.to_lowercase();
    }
    if let Some(language) = args.language {
        settings.language = language.to_lowercase();
    }
    if let Some(names) = args.media {
        settings.media = MediaSelection::from_names(&names);
    }

    if !settings.auto_scrape {
        log::warn!("Auto-scrape is disabled in the configuration; nothing to do");
        return Ok(());
    }

    let library = scan_library(root, args.systems.as_deref())?;
    let games = select_games(&library, args.limit);
    if games.is_empty() {
        log::info!("No games found under {}", root.display());
        return Ok(());
    }
    log::info!(
        "Found {} games in {} systems",
        games.len(),
        library.systems.len()
    );

    let engines = connect(&settings, quiet)?;
    let scraper = SeamlessScraper::new(engines, SeamlessSettings::from(&settings))?;

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::with_template("  {bar:30.cyan/dim} {pos}/{len} {wide_msg}")
        {
            pb.set_style(style);
        }
        pb
    };
    let tally = Arc::new(ScrapeTally::new(pb.clone()));

    let accepted = drive(&scraper, &games, &tally, FRAME);
    pb.finish_and_clear();
    scraper.shutdown();

    let skipped = games.len() - accepted;
    let saved = save_sidecars(&library);
    log::info!(
        "{} Scraped {} games ({} updated, {} skipped as recent or read-only); saved {} gamelists",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        tally.completed(),
        tally.updated(),
        skipped,
        saved,
    );
    Ok(())
}
