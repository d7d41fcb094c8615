use thiserror::Error;

use retro_shelf_core::LibraryError;
use retro_shelf_scraper::ScrapeError;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("{0}")]
    Scrape(#[from] ScrapeError),

    #[error("Config error: {0}")]
    Config(String),
}

impl CliError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Hint printed under the error, if any.
    pub(crate) fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Scrape(ScrapeError::Config(_) | ScrapeError::InvalidCredentials(_)) => Some(
                "Set SCREENSCRAPER_DEVID and SCREENSCRAPER_DEVPASSWORD (plus SCREENSCRAPER_SSID / \
                 SCREENSCRAPER_SSPASSWORD for a user account), or add them to the config file \
                 shown by 'retro-shelf config path'.",
            ),
            _ => None,
        }
    }
}
