use retro_shelf_core::Platform;

/// ScreenScraper system ID of a platform.
///
/// These ids are a third-party API detail, so they live with the client
/// rather than on `Platform`.
pub fn screenscraper_system_id(platform: Platform) -> Option<u32> {
    let id = match platform {
        Platform::Nes => 3,
        Platform::Snes => 4,
        Platform::N64 => 14,
        Platform::GameCube => 13,
        Platform::Wii => 16,
        Platform::GameBoy => 9,
        Platform::GameBoyColor => 10,
        Platform::Gba => 12,
        Platform::Ds => 15,

        Platform::Sg1000 => 109,
        Platform::MasterSystem => 2,
        Platform::Genesis => 1,
        Platform::SegaCd => 20,
        Platform::Sega32x => 19,
        Platform::Saturn => 22,
        Platform::Dreamcast => 23,
        Platform::GameGear => 21,

        Platform::Ps1 => 57,
        Platform::Ps2 => 58,
        Platform::Psp => 61,

        Platform::PcEngine => 31,
        Platform::NeoGeo => 142,
        Platform::Arcade => 75,
    };
    Some(id)
}

/// Other ScreenScraper systems whose matches are valid for a platform.
///
/// ScreenScraper files dual-mode GB/GBC cartridges under either system,
/// so a lookup sent as one may come back as the other.
pub fn acceptable_system_ids(platform: Platform) -> &'static [u32] {
    match platform {
        Platform::GameBoy => &[10],
        Platform::GameBoyColor => &[9],
        Platform::Genesis => &[20, 19],
        Platform::NeoGeo => &[75],
        _ => &[],
    }
}
