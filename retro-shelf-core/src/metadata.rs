use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::region::Region;

bitflags::bitflags! {
    /// Which metadata fields a scrape touched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MetadataChanges: u32 {
        const NAME = 1 << 0;
        const DESCRIPTION = 1 << 1;
        const DEVELOPER = 1 << 2;
        const PUBLISHER = 1 << 3;
        const GENRE = 1 << 4;
        const PLAYERS = 1 << 5;
        const RATING = 1 << 6;
        const RELEASE_DATE = 1 << 7;
        const REGION = 1 << 8;
        const ROM_HASH = 1 << 9;
        const IMAGE = 1 << 10;
        const THUMBNAIL = 1 << 11;
        const VIDEO = 1 << 12;
        const MARQUEE = 1 << 13;
        const WHEEL = 1 << 14;
        const MANUAL = 1 << 15;
        const MAP = 1 << 16;

        const TEXT = Self::NAME.bits()
            | Self::DESCRIPTION.bits()
            | Self::DEVELOPER.bits()
            | Self::PUBLISHER.bits()
            | Self::GENRE.bits()
            | Self::PLAYERS.bits()
            | Self::RATING.bits()
            | Self::RELEASE_DATE.bits()
            | Self::REGION.bits()
            | Self::ROM_HASH.bits();
        const IMAGES = Self::IMAGE.bits() | Self::THUMBNAIL.bits();
        const EXTRA = Self::MARQUEE.bits()
            | Self::WHEEL.bits()
            | Self::MANUAL.bits()
            | Self::MAP.bits();
    }
}

/// Metadata attached to one game.
///
/// Every field is optional: a fresh library entry only knows its file name.
/// `timestamp` records the last successful scrape and drives the
/// freshness check of background scraping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    /// Player count as reported by the provider ("1", "1-4").
    pub players: Option<String>,
    /// Rating from 0.0 to 1.0
    pub rating: Option<f32>,
    /// Release date in YYYY-MM-DD format
    pub release_date: Option<String>,
    pub region: Option<Region>,
    /// Lowercase hex MD5 of the ROM file.
    pub rom_hash: Option<String>,

    pub image: Option<PathBuf>,
    pub thumbnail: Option<PathBuf>,
    pub video: Option<PathBuf>,
    pub marquee: Option<PathBuf>,
    pub wheel: Option<PathBuf>,
    pub manual: Option<PathBuf>,
    pub map: Option<PathBuf>,

    pub timestamp: Option<DateTime<Utc>>,
}

impl Metadata {
    /// True when nothing beyond the file name has ever been filled in.
    pub fn is_blank(&self) -> bool {
        *self == Metadata::default()
    }

    /// Mutable slot for a single-field media change flag.
    pub fn media_slot(&mut self, change: MetadataChanges) -> Option<&mut Option<PathBuf>> {
        let slot = match change {
            c if c == MetadataChanges::IMAGE => &mut self.image,
            c if c == MetadataChanges::THUMBNAIL => &mut self.thumbnail,
            c if c == MetadataChanges::VIDEO => &mut self.video,
            c if c == MetadataChanges::MARQUEE => &mut self.marquee,
            c if c == MetadataChanges::WHEEL => &mut self.wheel,
            c if c == MetadataChanges::MANUAL => &mut self.manual,
            c if c == MetadataChanges::MAP => &mut self.map,
            _ => return None,
        };
        Some(slot)
    }
}

/// Store `value` into `slot` and report whether the field changed.
///
/// With `overwrite == false` an already populated slot is kept as is.
/// Empty strings never replace anything.
pub fn assign<T: PartialEq>(slot: &mut Option<T>, value: Option<T>, overwrite: bool) -> bool {
    let Some(value) = value else {
        return false;
    };
    if slot.is_some() && !overwrite {
        return false;
    }
    if slot.as_ref() == Some(&value) {
        return false;
    }
    *slot = Some(value);
    true
}

/// [`assign`] for text fields, ignoring blank provider values.
pub fn assign_text(slot: &mut Option<String>, value: Option<&str>, overwrite: bool) -> bool {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    assign(slot, value, overwrite)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_keeps_existing_value_unless_overwriting() {
        let mut slot = Some("Old".to_string());
        assert!(!assign(&mut slot, Some("New".to_string()), false));
        assert_eq!(slot.as_deref(), Some("Old"));

        assert!(assign(&mut slot, Some("New".to_string()), true));
        assert_eq!(slot.as_deref(), Some("New"));
    }

    #[test]
    fn assign_same_value_is_not_a_change() {
        let mut slot = Some(3u8);
        assert!(!assign(&mut slot, Some(3), true));
    }

    #[test]
    fn assign_text_ignores_blank_values() {
        let mut slot = None;
        assert!(!assign_text(&mut slot, Some("   "), true));
        assert!(slot.is_none());
        assert!(assign_text(&mut slot, Some(" Sonic "), false));
        assert_eq!(slot.as_deref(), Some("Sonic"));
    }

    #[test]
    fn blank_metadata() {
        let mut md = Metadata::default();
        assert!(md.is_blank());
        md.genre = Some("Platform".into());
        assert!(!md.is_blank());
    }

    #[test]
    fn stage_groups_do_not_overlap() {
        assert!((MetadataChanges::TEXT & MetadataChanges::IMAGES).is_empty());
        assert!((MetadataChanges::TEXT & MetadataChanges::EXTRA).is_empty());
        assert!((MetadataChanges::IMAGES & MetadataChanges::VIDEO).is_empty());
        assert!(MetadataChanges::EXTRA.contains(MetadataChanges::MANUAL));
    }

    #[test]
    fn media_slot_only_for_single_media_flags() {
        let mut md = Metadata::default();
        assert!(md.media_slot(MetadataChanges::IMAGES).is_none());
        assert!(md.media_slot(MetadataChanges::NAME).is_none());
        *md.media_slot(MetadataChanges::WHEEL).unwrap() = Some(PathBuf::from("w.png"));
        assert_eq!(md.wheel, Some(PathBuf::from("w.png")));
    }
}
