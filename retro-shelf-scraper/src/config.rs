//! Scraper configuration: ScreenScraper credentials and background
//! scraping settings.
//!
//! Priority for every value: CLI override > environment variable >
//! `config.toml` > default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;
use crate::media::MediaSelection;

pub const ENV_DEV_ID: &str = "SCREENSCRAPER_DEVID";
pub const ENV_DEV_PASSWORD: &str = "SCREENSCRAPER_DEVPASSWORD";
pub const ENV_SOFT_NAME: &str = "SCREENSCRAPER_SOFTNAME";
pub const ENV_USER_ID: &str = "SCREENSCRAPER_SSID";
pub const ENV_USER_PASSWORD: &str = "SCREENSCRAPER_SSPASSWORD";
pub const ENV_AUTO_SCRAPE: &str = "RETRO_SHELF_AUTO_SCRAPE";

const DEFAULT_SOFT_NAME: &str = "retro-shelf";
const DEFAULT_ENGINES: usize = 4;
/// ScreenScraper grants at most this many threads to any account.
pub const MAX_ENGINES: usize = 8;

/// Credentials for authenticating with the ScreenScraper API.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub dev_id: String,
    pub dev_password: String,
    pub soft_name: String,
    pub user_id: Option<String>,
    pub user_password: Option<String>,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    EnvVar(&'static str),
    ConfigFile,
    Default,
    Missing,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvVar(var) => write!(f, "env ${}", var),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
            Self::Missing => write!(f, "not set"),
        }
    }
}

/// Provenance of each credential field.
#[derive(Debug)]
pub struct CredentialSources {
    pub dev_id: ConfigSource,
    pub dev_password: ConfigSource,
    pub soft_name: ConfigSource,
    pub user_id: ConfigSource,
    pub user_password: ConfigSource,
}

/// Settings of the background scraper.
#[derive(Debug, Clone)]
pub struct ScraperSettings {
    /// Master switch for seamless scraping.
    pub auto_scrape: bool,
    /// Number of engines, which is also the number of worker threads.
    pub engines: usize,
    /// Preferred ScreenScraper region code for names and media.
    pub region: String,
    /// Preferred description language.
    pub language: String,
    pub media: MediaSelection,
    /// ROMs above this size are looked up by name only.
    pub max_hash_size: u64,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            auto_scrape: true,
            engines: DEFAULT_ENGINES,
            region: "us".to_string(),
            language: "en".to_string(),
            media: MediaSelection::default(),
            max_hash_size: retro_shelf_core::hasher::DEFAULT_MAX_HASH_SIZE,
        }
    }
}

/// TOML config file format.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    pub screenscraper: Option<ScreenScraperSection>,
    pub scraper: Option<ScraperSection>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ScreenScraperSection {
    pub dev_id: Option<String>,
    pub dev_password: Option<String>,
    pub soft_name: Option<String>,
    pub user_id: Option<String>,
    pub user_password: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ScraperSection {
    pub auto_scrape: Option<bool>,
    pub engines: Option<usize>,
    pub region: Option<String>,
    pub language: Option<String>,
    pub media: Option<Vec<String>>,
    pub max_hash_size: Option<u64>,
}

/// Return the path to the config file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("retro-shelf").join("config.toml"))
}

/// Parse a config file. A missing file is an empty config.
pub fn read_config_file(path: &Path) -> Result<ConfigFile, ScrapeError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ConfigFile::default()),
        Err(e) => return Err(e.into()),
    };
    toml::from_str(&content)
        .map_err(|e| ScrapeError::Config(format!("{}: {}", path.display(), e)))
}

/// Load the config file from its default location.
pub fn load_config_file() -> Result<ConfigFile, ScrapeError> {
    match config_path() {
        Some(path) => read_config_file(&path),
        None => Ok(ConfigFile::default()),
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl Credentials {
    /// Load credentials from the environment and the default config file.
    pub fn load() -> Result<Self, ScrapeError> {
        let file = load_config_file()?;
        Self::resolve(file.screenscraper.as_ref(), env_var)
    }

    /// Resolve credentials from a config section and an environment lookup.
    ///
    /// Required: dev_id, dev_password. Optional: user_id, user_password.
    pub fn resolve(
        file: Option<&ScreenScraperSection>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ScrapeError> {
        let from_file = |pick: fn(&ScreenScraperSection) -> &Option<String>| {
            file.and_then(|s| pick(s).clone())
        };

        let dev_id = env(ENV_DEV_ID)
            .or_else(|| from_file(|s| &s.dev_id))
            .ok_or_else(|| {
                ScrapeError::Config(format!(
                    "Missing dev_id. Set {} or add it to the config file",
                    ENV_DEV_ID
                ))
            })?;
        let dev_password = env(ENV_DEV_PASSWORD)
            .or_else(|| from_file(|s| &s.dev_password))
            .ok_or_else(|| {
                ScrapeError::Config(format!(
                    "Missing dev_password. Set {} or add it to the config file",
                    ENV_DEV_PASSWORD
                ))
            })?;
        let soft_name = env(ENV_SOFT_NAME)
            .or_else(|| from_file(|s| &s.soft_name))
            .unwrap_or_else(|| DEFAULT_SOFT_NAME.to_string());

        Ok(Self {
            dev_id,
            dev_password,
            soft_name,
            user_id: env(ENV_USER_ID).or_else(|| from_file(|s| &s.user_id)),
            user_password: env(ENV_USER_PASSWORD).or_else(|| from_file(|s| &s.user_password)),
        })
    }
}

/// Determine where each credential field is coming from.
pub fn credential_sources(
    file: Option<&ScreenScraperSection>,
    env: impl Fn(&str) -> Option<String>,
) -> CredentialSources {
    let source = |var: &'static str, in_file: bool, default: ConfigSource| {
        if env(var).is_some() {
            ConfigSource::EnvVar(var)
        } else if in_file {
            ConfigSource::ConfigFile
        } else {
            default
        }
    };
    let has = |pick: fn(&ScreenScraperSection) -> bool| file.is_some_and(pick);

    CredentialSources {
        dev_id: source(ENV_DEV_ID, has(|s| s.dev_id.is_some()), ConfigSource::Missing),
        dev_password: source(
            ENV_DEV_PASSWORD,
            has(|s| s.dev_password.is_some()),
            ConfigSource::Missing,
        ),
        soft_name: source(ENV_SOFT_NAME, has(|s| s.soft_name.is_some()), ConfigSource::Default),
        user_id: source(ENV_USER_ID, has(|s| s.user_id.is_some()), ConfigSource::Missing),
        user_password: source(
            ENV_USER_PASSWORD,
            has(|s| s.user_password.is_some()),
            ConfigSource::Missing,
        ),
    }
}

impl ScraperSettings {
    /// Load settings from the environment and the default config file.
    pub fn load() -> Result<Self, ScrapeError> {
        let file = load_config_file()?;
        Ok(Self::resolve(file.scraper.as_ref(), env_var))
    }

    pub fn resolve(file: Option<&ScraperSection>, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(section) = file {
            if let Some(auto) = section.auto_scrape {
                settings.auto_scrape = auto;
            }
            if let Some(n) = section.engines {
                settings.engines = n;
            }
            if let Some(ref region) = section.region {
                settings.region = region.to_lowercase();
            }
            if let Some(ref language) = section.language {
                settings.language = language.to_lowercase();
            }
            if let Some(ref names) = section.media {
                settings.media = MediaSelection::from_names(names);
            }
            if let Some(max) = section.max_hash_size {
                settings.max_hash_size = max;
            }
        }

        if let Some(value) = env(ENV_AUTO_SCRAPE) {
            match parse_bool(&value) {
                Some(auto) => settings.auto_scrape = auto,
                None => log::warn!("Ignoring {}={:?}: not a boolean", ENV_AUTO_SCRAPE, value),
            }
        }

        settings.engines = settings.engines.clamp(1, MAX_ENGINES);
        settings
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn env_overrides_file_credentials() {
        let file = ScreenScraperSection {
            dev_id: Some("file-dev".into()),
            dev_password: Some("file-pw".into()),
            user_id: Some("file-user".into()),
            ..Default::default()
        };
        let creds =
            Credentials::resolve(Some(&file), env_of(&[(ENV_DEV_ID, "env-dev")])).unwrap();
        assert_eq!(creds.dev_id, "env-dev");
        assert_eq!(creds.dev_password, "file-pw");
        assert_eq!(creds.soft_name, DEFAULT_SOFT_NAME);
        assert_eq!(creds.user_id.as_deref(), Some("file-user"));
        assert!(creds.user_password.is_none());
    }

    #[test]
    fn missing_dev_credentials_is_a_config_error() {
        let err = Credentials::resolve(None, env_of(&[])).unwrap_err();
        assert!(matches!(err, ScrapeError::Config(ref m) if m.contains(ENV_DEV_ID)));
    }

    #[test]
    fn sources_report_provenance() {
        let file = ScreenScraperSection {
            dev_password: Some("pw".into()),
            ..Default::default()
        };
        let sources = credential_sources(Some(&file), env_of(&[(ENV_DEV_ID, "x")]));
        assert_eq!(sources.dev_id, ConfigSource::EnvVar(ENV_DEV_ID));
        assert_eq!(sources.dev_password, ConfigSource::ConfigFile);
        assert_eq!(sources.soft_name, ConfigSource::Default);
        assert_eq!(sources.user_id, ConfigSource::Missing);
    }

    #[test]
    fn settings_from_toml_and_env() {
        let file: ConfigFile = toml::from_str(
            r#"
            [scraper]
            auto_scrape = true
            engines = 32
            region = "EU"
            media = ["screenshot", "video"]
            "#,
        )
        .unwrap();
        let settings = ScraperSettings::resolve(
            file.scraper.as_ref(),
            env_of(&[(ENV_AUTO_SCRAPE, "off")]),
        );
        assert!(!settings.auto_scrape);
        assert_eq!(settings.engines, MAX_ENGINES);
        assert_eq!(settings.region, "eu");
        assert_eq!(settings.media.types.len(), 2);
    }

    #[test]
    fn bad_env_bool_keeps_file_value() {
        let section = ScraperSection {
            auto_scrape: Some(false),
            ..Default::default()
        };
        let settings =
            ScraperSettings::resolve(Some(&section), env_of(&[(ENV_AUTO_SCRAPE, "maybe")]));
        assert!(!settings.auto_scrape);
    }

    #[test]
    fn missing_config_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = read_config_file(&dir.path().join("config.toml")).unwrap();
        assert!(file.screenscraper.is_none());
        assert!(file.scraper.is_none());
    }

    #[test]
    fn malformed_config_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scraper\nengines = ").unwrap();
        let err = read_config_file(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
