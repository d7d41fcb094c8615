use std::collections::HashMap;

use retro_shelf_core::{Platform, RomHashes};

use crate::client::ScreenScraperClient;
use crate::error::ScrapeError;
use crate::protected_set::ProtectedSet;
use crate::systems::{acceptable_system_ids, screenscraper_system_id};
use crate::types::GameInfo;

/// How a game was matched in ScreenScraper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMethod {
    /// MD5 + CRC32 + size
    Hash,
    /// File name + size
    Filename,
}

impl std::fmt::Display for LookupMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupMethod::Hash => write!(f, "hash"),
            LookupMethod::Filename => write!(f, "filename"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LookupResult {
    pub game: GameInfo,
    pub method: LookupMethod,
    pub warnings: Vec<String>,
}

/// What the lookup knows about a ROM file.
#[derive(Debug, Clone)]
pub struct RomInfo {
    pub platform: Platform,
    /// File name with extension
    pub filename: String,
    pub file_size: u64,
    /// Absent when the platform is not hashable or the file is too large.
    pub hashes: Option<RomHashes>,
}

impl RomInfo {
    /// Key under which this ROM's lookup is recorded in the protected set.
    pub fn lookup_key(&self) -> String {
        match self.hashes {
            Some(ref h) => format!("{}:{}", self.platform.short_name(), h.md5),
            None => format!("{}:{}", self.platform.short_name(), self.filename),
        }
    }
}

/// Remote game database queried by [`lookup_game`].
pub trait GameSource {
    fn find_game(&self, params: HashMap<&'static str, String>) -> Result<GameInfo, ScrapeError>;
}

impl GameSource for ScreenScraperClient {
    fn find_game(&self, params: HashMap<&'static str, String>) -> Result<GameInfo, ScrapeError> {
        Ok(self.lookup_game(params)?.response.jeu)
    }
}

/// Look up a game, hash first and then by file name.
///
/// A match on the wrong system counts as a miss and the next tier is tried.
/// Errors other than "not found" end the lookup immediately.
pub fn lookup_game(source: &dyn GameSource, rom: &RomInfo) -> Result<LookupResult, ScrapeError> {
    let system_id =
        screenscraper_system_id(rom.platform).ok_or(ScrapeError::UnsupportedSystem(rom.platform))?;
    let mut warnings = Vec::new();

    let mut tiers = Vec::with_capacity(2);
    if let Some(ref hashes) = rom.hashes {
        tiers.push((LookupMethod::Hash, hash_params(system_id, rom, hashes)));
    }
    tiers.push((LookupMethod::Filename, filename_params(system_id, rom)));

    for (method, params) in tiers {
        match source.find_game(params) {
            Ok(game) => match check_platform_mismatch(&game, system_id, rom.platform) {
                Some(mismatch) => warnings.push(format!(
                    "{} lookup of '{}' matched wrong platform: {}",
                    method, rom.filename, mismatch
                )),
                None => {
                    return Ok(LookupResult {
                        game,
                        method,
                        warnings,
                    });
                }
            },
            Err(ScrapeError::NotFound { .. }) => {
                warnings.push(format!("{} lookup of '{}' found nothing", method, rom.filename));
            }
            Err(e) => return Err(e),
        }
    }

    Err(ScrapeError::NotFound { warnings })
}

/// [`lookup_game`] at most once per lookup key and run.
///
/// Returns `Ok(None)` when the key was already settled by an earlier
/// lookup. A match or a "not found" settles the key; any other error
/// releases it so a later attempt looks the game up again.
pub fn lookup_once(
    source: &dyn GameSource,
    rom: &RomInfo,
    protected: &ProtectedSet,
) -> Result<Option<LookupResult>, ScrapeError> {
    let key = rom.lookup_key();
    if protected.exists(&key) {
        return Ok(None);
    }
    match lookup_game(source, rom) {
        Ok(found) => Ok(Some(found)),
        Err(e @ ScrapeError::NotFound { .. }) => Err(e),
        Err(e) => {
            protected.remove(&key);
            Err(e)
        }
    }
}

/// `None` when the system matches or can't be determined.
fn check_platform_mismatch(game: &GameInfo, expected_id: u32, platform: Platform) -> Option<String> {
    let returned_id = game.system_id()?;
    if returned_id == expected_id || acceptable_system_ids(platform).contains(&returned_id) {
        return None;
    }
    let returned_name = game.systeme.as_ref().map_or("?", |s| s.text.as_str());
    Some(format!(
        "expected {} (system {}) but got '{}' (system {})",
        platform.display_name(),
        expected_id,
        returned_name,
        returned_id,
    ))
}

fn filename_params(system_id: u32, rom: &RomInfo) -> HashMap<&'static str, String> {
    HashMap::from([
        ("systemeid", system_id.to_string()),
        ("romtype", "rom".to_string()),
        ("romnom", rom.filename.clone()),
        ("romtaille", rom.file_size.to_string()),
    ])
}

fn hash_params(system_id: u32, rom: &RomInfo, hashes: &RomHashes) -> HashMap<&'static str, String> {
    let mut params = filename_params(system_id, rom);
    params.insert("md5", hashes.md5.clone());
    params.insert("crc", hashes.crc32.clone());
    params
}

#[cfg(test)]
#[path = "tests/lookup_tests.rs"]
mod tests;
