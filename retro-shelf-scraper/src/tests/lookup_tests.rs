use super::*;
use std::cell::RefCell;
use std::collections::VecDeque;

use crate::types::IdText;

/// Answers lookups from a script and records the parameters it saw.
struct ScriptedSource {
    answers: RefCell<VecDeque<Result<GameInfo, ScrapeError>>>,
    seen: RefCell<Vec<HashMap<&'static str, String>>>,
}

impl ScriptedSource {
    fn new(answers: Vec<Result<GameInfo, ScrapeError>>) -> Self {
        Self {
            answers: RefCell::new(answers.into()),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl GameSource for ScriptedSource {
    fn find_game(&self, params: HashMap<&'static str, String>) -> Result<GameInfo, ScrapeError> {
        self.seen.borrow_mut().push(params);
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ScrapeError::not_found()))
    }
}

fn game_on_system(id: &str, system: u32) -> GameInfo {
    GameInfo {
        id: id.to_string(),
        notgame: None,
        noms: Vec::new(),
        synopsis: Vec::new(),
        dates: Vec::new(),
        medias: Vec::new(),
        editeur: None,
        developpeur: None,
        joueurs: None,
        note: None,
        genres: Vec::new(),
        systeme: Some(IdText {
            id: Some(system.to_string()),
            text: format!("system {}", system),
        }),
    }
}

fn snes_rom(hashed: bool) -> RomInfo {
    RomInfo {
        platform: Platform::Snes,
        filename: "Super Mario World (USA).sfc".to_string(),
        file_size: 524_288,
        hashes: hashed.then(|| RomHashes {
            md5: "cdd3c8c37322978ca8669b34bc89c804".to_string(),
            crc32: "B19ED489".to_string(),
            size: 524_288,
        }),
    }
}

#[test]
fn hash_match_wins_first() {
    let source = ScriptedSource::new(vec![Ok(game_on_system("1", 4))]);
    let result = lookup_game(&source, &snes_rom(true)).unwrap();
    assert_eq!(result.method, LookupMethod::Hash);
    assert!(result.warnings.is_empty());

    let seen = source.seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["systemeid"], "4");
    assert_eq!(seen[0]["crc"], "B19ED489");
    assert_eq!(seen[0]["romtaille"], "524288");
}

#[test]
fn unhashed_rom_goes_straight_to_filename() {
    let source = ScriptedSource::new(vec![Ok(game_on_system("1", 4))]);
    let result = lookup_game(&source, &snes_rom(false)).unwrap();
    assert_eq!(result.method, LookupMethod::Filename);

    let seen = source.seen.borrow();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].contains_key("md5"));
    assert_eq!(seen[0]["romnom"], "Super Mario World (USA).sfc");
}

#[test]
fn hash_miss_falls_back_to_filename() {
    let source = ScriptedSource::new(vec![
        Err(ScrapeError::not_found()),
        Ok(game_on_system("2", 4)),
    ]);
    let result = lookup_game(&source, &snes_rom(true)).unwrap();
    assert_eq!(result.method, LookupMethod::Filename);
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn wrong_platform_is_a_miss() {
    // Mega Drive (1) answer for a SNES ROM on both tiers.
    let source = ScriptedSource::new(vec![Ok(game_on_system("1", 1)), Ok(game_on_system("1", 1))]);
    let err = lookup_game(&source, &snes_rom(true)).unwrap_err();
    match err {
        ScrapeError::NotFound { warnings } => {
            assert_eq!(warnings.len(), 2);
            assert!(warnings[0].contains("wrong platform"));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn game_boy_accepts_color_matches() {
    let source = ScriptedSource::new(vec![Ok(game_on_system("9", 10))]);
    let rom = RomInfo {
        platform: Platform::GameBoy,
        filename: "Link's Awakening DX.gb".to_string(),
        file_size: 1024,
        hashes: None,
    };
    assert!(lookup_game(&source, &rom).is_ok());
}

#[test]
fn fatal_errors_stop_the_lookup() {
    let source = ScriptedSource::new(vec![Err(ScrapeError::QuotaExceeded { used: 5, max: 5 })]);
    let err = lookup_game(&source, &snes_rom(true)).unwrap_err();
    assert!(matches!(err, ScrapeError::QuotaExceeded { .. }));
    assert_eq!(source.seen.borrow().len(), 1);
}

#[test]
fn lookup_key_prefers_hash() {
    assert_eq!(
        snes_rom(true).lookup_key(),
        "snes:cdd3c8c37322978ca8669b34bc89c804"
    );
    assert_eq!(
        snes_rom(false).lookup_key(),
        "snes:Super Mario World (USA).sfc"
    );
}

#[test]
fn transient_error_leaves_the_rom_retryable() {
    let protected = ProtectedSet::new();
    let rom = snes_rom(true);
    let source = ScriptedSource::new(vec![
        Err(ScrapeError::RateLimit),
        Ok(game_on_system("1", 4)),
    ]);

    let first = lookup_once(&source, &rom, &protected);
    assert!(matches!(first, Err(ScrapeError::RateLimit)));
    assert!(protected.is_empty());

    let retry = lookup_once(&source, &rom, &protected).unwrap();
    assert_eq!(retry.map(|r| r.method), Some(LookupMethod::Hash));
    assert_eq!(source.seen.borrow().len(), 2);
}

#[test]
fn settled_rom_is_not_looked_up_twice() {
    let protected = ProtectedSet::new();
    let rom = snes_rom(false);

    let found = ScriptedSource::new(vec![Ok(game_on_system("1", 4))]);
    assert!(lookup_once(&found, &rom, &protected).unwrap().is_some());
    assert!(lookup_once(&found, &rom, &protected).unwrap().is_none());
    assert_eq!(found.seen.borrow().len(), 1);

    let missing = ScriptedSource::new(Vec::new());
    let other = RomInfo {
        filename: "Unknown (USA).sfc".to_string(),
        ..snes_rom(false)
    };
    let err = lookup_once(&missing, &other, &protected).unwrap_err();
    assert!(matches!(err, ScrapeError::NotFound { .. }));
    assert!(lookup_once(&missing, &other, &protected).unwrap().is_none());
    assert_eq!(missing.seen.borrow().len(), 1);
}
