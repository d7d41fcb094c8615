use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use retro_shelf_core::Platform;
use retro_shelf_scraper::screenscraper_system_id;

pub(crate) fn run_list() {
    log::info!("Supported systems:");
    log::info!("");

    let mut current_manufacturer = "";

    for platform in Platform::all() {
        if platform.manufacturer() != current_manufacturer {
            if !current_manufacturer.is_empty() {
                log::info!("");
            }
            current_manufacturer = platform.manufacturer();
            log::info!(
                "{}:",
                current_manufacturer.if_supports_color(Stdout, |t| t.bold()),
            );
        }

        let hashed = if platform.hashable() {
            format!(" {}", "(hash)".if_supports_color(Stdout, |t| t.green()))
        } else {
            String::new()
        };
        log::info!(
            "  {} [{}]{}",
            platform.short_name().if_supports_color(Stdout, |t| t.bold()),
            platform.display_name().if_supports_color(Stdout, |t| t.cyan()),
            hashed,
        );
        log::info!("    Extensions: {}", platform.extensions().join(", "));
        if !platform.aliases().is_empty() {
            log::info!("    Folder names: {}", platform.aliases().join(", "));
        }
        if let Some(id) = screenscraper_system_id(*platform) {
            log::debug!("    ScreenScraper system: {}", id);
        }
    }
}
