use std::path::{Path, PathBuf};

use retro_shelf_core::MetadataChanges;

use crate::client::ScreenScraperClient;
use crate::error::ScrapeError;
use crate::types::GameInfo;

/// Media kinds a frontend can show for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// In-game screenshot, the main image of a game list
    Screenshot,
    /// Front box art, shown as thumbnail
    Cover,
    Video,
    Marquee,
    /// Logo / wheel image
    Wheel,
    Manual,
    Map,
}

/// Scrape stage that produces a media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaGroup {
    Images,
    Video,
    Extra,
}

impl MediaType {
    pub fn group(&self) -> MediaGroup {
        match self {
            MediaType::Screenshot | MediaType::Cover => MediaGroup::Images,
            MediaType::Video => MediaGroup::Video,
            MediaType::Marquee | MediaType::Wheel | MediaType::Manual | MediaType::Map => {
                MediaGroup::Extra
            }
        }
    }

    /// Metadata field filled by this media type.
    pub fn change(&self) -> MetadataChanges {
        match self {
            MediaType::Screenshot => MetadataChanges::IMAGE,
            MediaType::Cover => MetadataChanges::THUMBNAIL,
            MediaType::Video => MetadataChanges::VIDEO,
            MediaType::Marquee => MetadataChanges::MARQUEE,
            MediaType::Wheel => MetadataChanges::WHEEL,
            MediaType::Manual => MetadataChanges::MANUAL,
            MediaType::Map => MetadataChanges::MAP,
        }
    }

    /// File extension when the provider does not report a format.
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaType::Video => "mp4",
            MediaType::Manual => "pdf",
            _ => "png",
        }
    }
}

/// Configuration for which media types to download.
#[derive(Debug, Clone)]
pub struct MediaSelection {
    pub types: Vec<MediaType>,
}

impl Default for MediaSelection {
    fn default() -> Self {
        Self {
            types: vec![MediaType::Screenshot, MediaType::Cover, MediaType::Wheel],
        }
    }
}

impl MediaSelection {
    pub fn all() -> Self {
        Self {
            types: vec![
                MediaType::Screenshot,
                MediaType::Cover,
                MediaType::Video,
                MediaType::Marquee,
                MediaType::Wheel,
                MediaType::Manual,
                MediaType::Map,
            ],
        }
    }

    /// Parse from a list of names (e.g., `["covers", "screenshots", "videos"]`).
    /// Unknown names are skipped with a warning.
    pub fn from_names(names: &[String]) -> Self {
        let types = names
            .iter()
            .filter_map(|n| match n.trim().to_lowercase().as_str() {
                "screenshots" | "screenshot" | "images" | "image" => Some(MediaType::Screenshot),
                "covers" | "cover" | "thumbnails" | "thumbnail" => Some(MediaType::Cover),
                "videos" | "video" => Some(MediaType::Video),
                "marquees" | "marquee" => Some(MediaType::Marquee),
                "wheels" | "wheel" | "logos" | "logo" => Some(MediaType::Wheel),
                "manuals" | "manual" => Some(MediaType::Manual),
                "maps" | "map" => Some(MediaType::Map),
                other => {
                    log::warn!("Unknown media type '{}'", other);
                    None
                }
            })
            .collect();
        Self { types }
    }

    pub fn in_group(&self, group: MediaGroup) -> impl Iterator<Item = MediaType> + '_ {
        self.types.iter().copied().filter(move |t| t.group() == group)
    }

    pub fn has_group(&self, group: MediaGroup) -> bool {
        self.in_group(group).next().is_some()
    }
}

/// Map a MediaType to the ScreenScraper media type string.
fn ss_media_type(mt: MediaType) -> &'static str {
    match mt {
        MediaType::Screenshot => "ss",
        MediaType::Cover => "box-2D",
        MediaType::Video => "video-normalized",
        MediaType::Marquee => "screenmarquee",
        MediaType::Wheel => "wheel-hd",
        MediaType::Manual => "manuel",
        MediaType::Map => "maps",
    }
}

/// Fallback ScreenScraper media type if the primary isn't found.
fn ss_media_type_fallback(mt: MediaType) -> Option<&'static str> {
    match mt {
        MediaType::Wheel => Some("wheel"),
        MediaType::Video => Some("video"),
        MediaType::Marquee => Some("screenmarqueesmall"),
        _ => None,
    }
}

/// Subdirectory name for a media type, under `<collection>/media/`.
pub fn media_subdir(mt: MediaType) -> &'static str {
    match mt {
        MediaType::Screenshot => "images",
        MediaType::Cover => "thumbnails",
        MediaType::Video => "videos",
        MediaType::Marquee => "marquees",
        MediaType::Wheel => "wheels",
        MediaType::Manual => "manuals",
        MediaType::Map => "maps",
    }
}

/// Destination of a media file for a ROM.
pub fn media_path(media_root: &Path, mt: MediaType, rom_stem: &str, format: &str) -> PathBuf {
    let ext = if format.is_empty() {
        mt.default_extension()
    } else {
        format
    };
    media_root
        .join(media_subdir(mt))
        .join(format!("{}.{}", rom_stem, ext))
}

/// Download one media type for a game.
///
/// Returns `Ok(None)` when the provider has no media of that type. An
/// existing file at the destination is reused without downloading.
pub fn download_media(
    client: &ScreenScraperClient,
    game: &GameInfo,
    mt: MediaType,
    media_root: &Path,
    rom_stem: &str,
    preferred_region: &str,
) -> Result<Option<PathBuf>, ScrapeError> {
    let media = game
        .media_for_region(ss_media_type(mt), preferred_region)
        .or_else(|| {
            ss_media_type_fallback(mt).and_then(|fb| game.media_for_region(fb, preferred_region))
        });
    let Some(media) = media else {
        return Ok(None);
    };

    let dest = media_path(media_root, mt, rom_stem, &media.format);
    if dest.exists() {
        return Ok(Some(dest));
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let bytes = client.download_media(&media.url)?;
    let tmp = dest.with_extension("part");
    std::fs::write(&tmp, &bytes)?;
    std::fs::rename(&tmp, &dest)?;
    log::debug!("Downloaded {} ({} bytes)", dest.display(), bytes.len());
    Ok(Some(dest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_with_plurals_and_case() {
        let names = ["Screenshots", "video", "logo", "bogus"].map(String::from);
        let selection = MediaSelection::from_names(&names);
        assert_eq!(
            selection.types,
            vec![MediaType::Screenshot, MediaType::Video, MediaType::Wheel]
        );
    }

    #[test]
    fn groups_follow_scrape_stages() {
        let selection = MediaSelection::all();
        let images: Vec<_> = selection.in_group(MediaGroup::Images).collect();
        assert_eq!(images, vec![MediaType::Screenshot, MediaType::Cover]);
        assert!(selection.has_group(MediaGroup::Extra));

        let default = MediaSelection::default();
        assert!(!default.has_group(MediaGroup::Video));
    }

    #[test]
    fn media_path_uses_format_or_default_extension() {
        let root = Path::new("/roms/snes/media");
        assert_eq!(
            media_path(root, MediaType::Video, "Zelda", ""),
            PathBuf::from("/roms/snes/media/videos/Zelda.mp4")
        );
        assert_eq!(
            media_path(root, MediaType::Cover, "Zelda", "jpg"),
            PathBuf::from("/roms/snes/media/thumbnails/Zelda.jpg")
        );
    }

    #[test]
    fn every_media_type_maps_to_one_field() {
        for mt in MediaSelection::all().types {
            assert_eq!(mt.change().bits().count_ones(), 1, "{:?}", mt);
        }
    }
}
