//! Scrape engine backed by the ScreenScraper API.

use std::path::{Path, PathBuf};

use chrono::Utc;
use retro_shelf_core::metadata::{assign, assign_text};
use retro_shelf_core::{GameRef, Metadata, MetadataChanges, Region, compute_rom_hashes};

use crate::client::ScreenScraperClient;
use crate::config::ScraperSettings;
use crate::engine::{ScrapeEngine, ScrapingMethod, Stage, StageSink};
use crate::error::ScrapeError;
use crate::lookup::{RomInfo, lookup_once};
use crate::media::{MediaGroup, MediaSelection, MediaType, download_media};
use crate::protected_set::ProtectedSet;
use crate::types::GameInfo;

/// Directory under a collection that receives downloaded media.
pub const MEDIA_DIR: &str = "media";

pub struct ScreenScraperEngine {
    client: ScreenScraperClient,
    region: String,
    language: String,
    media: MediaSelection,
    max_hash_size: u64,
}

impl ScreenScraperEngine {
    pub fn new(client: ScreenScraperClient, settings: &ScraperSettings) -> Self {
        Self {
            client,
            region: settings.region.clone(),
            language: settings.language.clone(),
            media: settings.media.clone(),
            max_hash_size: settings.max_hash_size,
        }
    }

    /// `count` engines, each with its own session on the client's account.
    pub fn sessions(
        client: ScreenScraperClient,
        settings: &ScraperSettings,
        count: usize,
    ) -> Vec<Box<dyn ScrapeEngine>> {
        let mut engines: Vec<Box<dyn ScrapeEngine>> = (1..count)
            .map(|_| Box::new(Self::new(client.fork(), settings)) as Box<dyn ScrapeEngine>)
            .collect();
        engines.push(Box::new(Self::new(client, settings)));
        engines
    }

    fn rom_info(&self, game: &GameRef) -> Result<RomInfo, ScrapeError> {
        let platform = game.platform();
        let file_size = std::fs::metadata(game.path())?.len();
        let hashes = if platform.hashable() {
            compute_rom_hashes(game.path(), self.max_hash_size)?
        } else {
            None
        };
        Ok(RomInfo {
            platform,
            filename: game.file_name().to_string(),
            file_size,
            hashes,
        })
    }

    /// Download one media type and record it. Existing files are kept
    /// unless the method overwrites.
    fn fetch_media(
        &self,
        game: &GameRef,
        info: &GameInfo,
        mt: MediaType,
        media_root: &Path,
        overwrite: bool,
    ) -> MetadataChanges {
        let needed = {
            let mut metadata = game.metadata_mut();
            let current = metadata.media_slot(mt.change()).and_then(|slot| slot.clone());
            overwrite || current.is_none_or(|p| !p.exists())
        };
        if !needed {
            return MetadataChanges::empty();
        }

        let path = match download_media(
            &self.client,
            info,
            mt,
            media_root,
            game.rom_stem(),
            &self.region,
        ) {
            Ok(Some(path)) => path,
            Ok(None) => return MetadataChanges::empty(),
            Err(e) => {
                log::warn!("{:?} download failed for {}: {}", mt, game.display_name(), e);
                return MetadataChanges::empty();
            }
        };

        record_media(&mut game.metadata_mut(), mt, path)
    }

    fn fetch_group(
        &self,
        game: &GameRef,
        info: &GameInfo,
        group: MediaGroup,
        media_root: &Path,
        overwrite: bool,
    ) -> MetadataChanges {
        self.media
            .in_group(group)
            .map(|mt| self.fetch_media(game, info, mt, media_root, overwrite))
            .fold(MetadataChanges::empty(), |acc, c| acc | c)
    }
}

/// Point the media field of `mt` at a downloaded file.
fn record_media(metadata: &mut Metadata, mt: MediaType, path: PathBuf) -> MetadataChanges {
    let changed = metadata
        .media_slot(mt.change())
        .is_some_and(|slot| assign(slot, Some(path), true));
    if changed {
        mt.change()
    } else {
        MetadataChanges::empty()
    }
}

/// Merge text fields of a lookup result into metadata.
fn merge_text(
    metadata: &mut Metadata,
    info: &GameInfo,
    rom: &RomInfo,
    region: &str,
    language: &str,
    overwrite: bool,
) -> MetadataChanges {
    let mut changes = MetadataChanges::empty();
    let mut set = |flag: MetadataChanges, changed: bool| {
        if changed {
            changes |= flag;
        }
    };

    set(
        MetadataChanges::NAME,
        assign_text(&mut metadata.name, info.name_for_region(region), overwrite),
    );
    set(
        MetadataChanges::DESCRIPTION,
        assign_text(
            &mut metadata.description,
            info.synopsis_for_language(language),
            overwrite,
        ),
    );
    set(
        MetadataChanges::DEVELOPER,
        assign_text(
            &mut metadata.developer,
            info.developpeur.as_ref().map(|d| d.text.as_str()),
            overwrite,
        ),
    );
    set(
        MetadataChanges::PUBLISHER,
        assign_text(
            &mut metadata.publisher,
            info.editeur.as_ref().map(|e| e.text.as_str()),
            overwrite,
        ),
    );
    set(
        MetadataChanges::GENRE,
        assign_text(
            &mut metadata.genre,
            info.genre_for_language(language).as_deref(),
            overwrite,
        ),
    );
    set(
        MetadataChanges::PLAYERS,
        assign_text(
            &mut metadata.players,
            info.joueurs.as_ref().map(|j| j.text.as_str()),
            overwrite,
        ),
    );
    set(
        MetadataChanges::RATING,
        assign(&mut metadata.rating, info.rating_normalized(), overwrite),
    );
    set(
        MetadataChanges::RELEASE_DATE,
        assign_text(
            &mut metadata.release_date,
            info.date_for_region(region),
            overwrite,
        ),
    );
    let release_region = info
        .dates
        .iter()
        .find(|d| d.region == region)
        .or_else(|| info.dates.first())
        .and_then(|d| Region::from_ss_code(&d.region));
    set(
        MetadataChanges::REGION,
        assign(&mut metadata.region, release_region, overwrite),
    );
    set(
        MetadataChanges::ROM_HASH,
        assign(
            &mut metadata.rom_hash,
            rom.hashes.as_ref().map(|h| h.md5.clone()),
            overwrite,
        ),
    );
    changes
}

impl ScrapeEngine for ScreenScraperEngine {
    fn scrape(
        &mut self,
        method: ScrapingMethod,
        game: &GameRef,
        protected: &ProtectedSet,
        sink: &mut dyn StageSink,
    ) -> Result<MetadataChanges, ScrapeError> {
        if !method.applies_to(&game.metadata()) {
            return Ok(MetadataChanges::empty());
        }
        self.client.ensure_quota()?;

        let rom = self.rom_info(game)?;
        let Some(found) = lookup_once(&self.client, &rom, protected)? else {
            log::debug!("{} already looked up this run; skipping", rom.lookup_key());
            return Ok(MetadataChanges::empty());
        };
        for warning in &found.warnings {
            log::debug!("{}: {}", game.display_name(), warning);
        }
        log::info!(
            "Matched {} by {} (ScreenScraper id {})",
            game.display_name(),
            found.method,
            found.game.id
        );

        let overwrite = method.overwrites();
        let info = &found.game;
        let text = merge_text(
            &mut game.metadata_mut(),
            info,
            &rom,
            &self.region,
            &self.language,
            overwrite,
        );
        sink.stage_completed(Stage::Text, text);
        let mut changes = text;

        let media_root: PathBuf = game.top_ancestor().path().join(MEDIA_DIR);
        let images = self.fetch_group(game, info, MediaGroup::Images, &media_root, overwrite);
        sink.stage_completed(Stage::Images, images);
        changes |= images;

        if self.media.has_group(MediaGroup::Video) {
            let video = self.fetch_group(game, info, MediaGroup::Video, &media_root, overwrite);
            sink.stage_completed(Stage::Video, video);
            changes |= video;
        }
        if self.media.has_group(MediaGroup::Extra) {
            let extra = self.fetch_group(game, info, MediaGroup::Extra, &media_root, overwrite);
            sink.stage_completed(Stage::Extra, extra);
            changes |= extra;
        }

        game.metadata_mut().timestamp = Some(Utc::now());
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IdText, RegionText};
    use retro_shelf_core::{Platform, RomHashes};

    fn info() -> GameInfo {
        GameInfo {
            id: "42".into(),
            notgame: None,
            noms: vec![RegionText {
                region: "us".into(),
                text: "Sonic the Hedgehog".into(),
            }],
            synopsis: Vec::new(),
            dates: vec![RegionText {
                region: "jp".into(),
                text: "1991-07-26".into(),
            }],
            medias: Vec::new(),
            editeur: Some(IdText {
                id: None,
                text: "Sega".into(),
            }),
            developpeur: Some(IdText {
                id: None,
                text: "  ".into(),
            }),
            joueurs: None,
            note: Some(IdText {
                id: None,
                text: "16".into(),
            }),
            genres: Vec::new(),
            systeme: None,
        }
    }

    fn rom() -> RomInfo {
        RomInfo {
            platform: Platform::Genesis,
            filename: "Sonic.md".into(),
            file_size: 512,
            hashes: Some(RomHashes {
                md5: "abc".into(),
                crc32: "0000BEEF".into(),
                size: 512,
            }),
        }
    }

    #[test]
    fn merge_fills_empty_fields() {
        let mut metadata = Metadata::default();
        let changes = merge_text(&mut metadata, &info(), &rom(), "us", "en", false);
        assert_eq!(
            changes,
            MetadataChanges::NAME
                | MetadataChanges::PUBLISHER
                | MetadataChanges::RATING
                | MetadataChanges::RELEASE_DATE
                | MetadataChanges::REGION
                | MetadataChanges::ROM_HASH
        );
        assert_eq!(metadata.name.as_deref(), Some("Sonic the Hedgehog"));
        assert_eq!(metadata.region, Some(Region::Japan));
        // Blank developer is not stored.
        assert!(metadata.developer.is_none());
    }

    #[test]
    fn merge_keeps_existing_unless_overwriting() {
        let mut metadata = Metadata {
            name: Some("My Sonic".into()),
            ..Default::default()
        };
        let kept = merge_text(&mut metadata, &info(), &rom(), "us", "en", false);
        assert!(!kept.contains(MetadataChanges::NAME));
        assert_eq!(metadata.name.as_deref(), Some("My Sonic"));

        let replaced = merge_text(&mut metadata, &info(), &rom(), "us", "en", true);
        assert!(replaced.contains(MetadataChanges::NAME));
        assert_eq!(metadata.name.as_deref(), Some("Sonic the Hedgehog"));
    }

    #[test]
    fn second_merge_reports_nothing_new() {
        let mut metadata = Metadata::default();
        merge_text(&mut metadata, &info(), &rom(), "us", "en", false);
        let again = merge_text(&mut metadata, &info(), &rom(), "us", "en", true);
        assert!(again.is_empty());
    }

    #[test]
    fn recorded_media_reports_only_real_changes() {
        let mut metadata = Metadata::default();
        let cover = PathBuf::from("/roms/megadrive/media/thumbnails/Sonic.png");

        let first = record_media(&mut metadata, MediaType::Cover, cover.clone());
        assert_eq!(first, MetadataChanges::THUMBNAIL);
        assert_eq!(metadata.thumbnail.as_ref(), Some(&cover));

        let again = record_media(&mut metadata, MediaType::Cover, cover);
        assert!(again.is_empty());
    }
}
