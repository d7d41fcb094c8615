use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use retro_shelf_scraper::config::{ENV_AUTO_SCRAPE, load_config_file};
use retro_shelf_scraper::{ConfigSource, Credentials, ScraperSettings, config_path, credential_sources};

use crate::error::CliError;

fn mask_value(s: &str) -> String {
    match s.char_indices().nth(2) {
        Some((cut, _)) => format!("{}****", &s[..cut]),
        None => "****".to_string(),
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn field_line(name: &str, value: Option<String>, source: &ConfigSource) {
    let source_str = format!("({})", source);
    let label = format!("{}:", name);
    match value {
        Some(v) => log::info!(
            "  {} {} {}",
            label.if_supports_color(Stdout, |t| t.cyan()),
            v,
            source_str.if_supports_color(Stdout, |t| t.dimmed()),
        ),
        None => log::info!(
            "  {} {} {}",
            label.if_supports_color(Stdout, |t| t.cyan()),
            "not set".if_supports_color(Stdout, |t| t.yellow()),
            source_str.if_supports_color(Stdout, |t| t.dimmed()),
        ),
    }
}

/// Show resolved settings and where each credential comes from.
pub(crate) fn run_config_show() -> Result<(), CliError> {
    let path = config_path();
    let file = load_config_file()?;

    log::info!(
        "{}",
        "retro-shelf configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("");

    match &path {
        Some(p) if p.exists() => log::info!(
            "  Config file: {} {}",
            p.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        ),
        Some(p) => log::info!(
            "  Config file: {} {}",
            p.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
        ),
        None => log::info!(
            "  Config file: {}",
            "could not determine path".if_supports_color(Stdout, |t| t.red()),
        ),
    }
    log::info!("");

    log::info!("{}", "ScreenScraper".if_supports_color(Stdout, |t| t.bold()));
    let sources = credential_sources(file.screenscraper.as_ref(), env_value);
    // Resolution fails while a required field is missing; show what we can.
    let creds = Credentials::resolve(file.screenscraper.as_ref(), env_value).ok();
    let secret = |v: String| mask_value(&v);

    field_line(
        "dev_id",
        creds.as_ref().map(|c| c.dev_id.clone()),
        &sources.dev_id,
    );
    field_line(
        "dev_password",
        creds.as_ref().map(|c| c.dev_password.clone()).map(secret),
        &sources.dev_password,
    );
    field_line(
        "soft_name",
        creds.as_ref().map(|c| c.soft_name.clone()),
        &sources.soft_name,
    );
    field_line(
        "user_id",
        creds.as_ref().and_then(|c| c.user_id.clone()),
        &sources.user_id,
    );
    field_line(
        "user_password",
        creds.as_ref().and_then(|c| c.user_password.clone()).map(secret),
        &sources.user_password,
    );
    log::info!("");

    let settings = ScraperSettings::resolve(file.scraper.as_ref(), env_value);
    let auto_source = if env_value(ENV_AUTO_SCRAPE).is_some() {
        ConfigSource::EnvVar(ENV_AUTO_SCRAPE)
    } else if file.scraper.as_ref().is_some_and(|s| s.auto_scrape.is_some()) {
        ConfigSource::ConfigFile
    } else {
        ConfigSource::Default
    };
    let media: Vec<String> = settings
        .media
        .types
        .iter()
        .map(|t| format!("{:?}", t).to_lowercase())
        .collect();

    log::info!("{}", "Scraper".if_supports_color(Stdout, |t| t.bold()));
    field_line("auto_scrape", Some(settings.auto_scrape.to_string()), &auto_source);
    log::info!("  engines: {}", settings.engines);
    log::info!("  region: {}", settings.region);
    log::info!("  language: {}", settings.language);
    log::info!("  media: {}", media.join(", "));
    log::info!("  max_hash_size: {} bytes", settings.max_hash_size);
    Ok(())
}

pub(crate) fn run_config_path() -> Result<(), CliError> {
    let path = config_path().ok_or_else(|| CliError::config("Could not determine config directory"))?;
    log::info!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_all_but_two_chars() {
        assert_eq!(mask_value("hunter2"), "hu****");
        assert_eq!(mask_value("ab"), "****");
        assert_eq!(mask_value("éèà"), "éè****");
    }
}
