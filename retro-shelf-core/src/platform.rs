use serde::{Deserialize, Serialize};

/// Systems a library folder can hold.
///
/// A collection folder is bound to a platform by matching its name against
/// `short_name()` and `aliases()`, so `megadrive/` and `genesis/` both land
/// on [`Platform::Genesis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    // Nintendo
    Nes,
    Snes,
    N64,
    GameCube,
    Wii,
    GameBoy,
    GameBoyColor,
    Gba,
    Ds,

    // Sega
    Sg1000,
    MasterSystem,
    Genesis,
    SegaCd,
    Sega32x,
    Saturn,
    Dreamcast,
    GameGear,

    // Sony
    Ps1,
    Ps2,
    Psp,

    // Others commonly found on handhelds
    PcEngine,
    NeoGeo,
    Arcade,
}

/// Static description of one platform.
#[derive(Debug)]
pub struct PlatformInfo {
    /// Canonical folder / CLI name. Always the first alias.
    pub short_name: &'static str,
    pub display_name: &'static str,
    pub manufacturer: &'static str,
    /// Lowercase names accepted for folders and CLI arguments.
    pub aliases: &'static [&'static str],
    /// ROM file extensions, lowercase, without the dot.
    pub extensions: &'static [&'static str],
}

const ALL_PLATFORMS: &[Platform] = &[
    Platform::Nes,
    Platform::Snes,
    Platform::N64,
    Platform::GameCube,
    Platform::Wii,
    Platform::GameBoy,
    Platform::GameBoyColor,
    Platform::Gba,
    Platform::Ds,
    Platform::Sg1000,
    Platform::MasterSystem,
    Platform::Genesis,
    Platform::SegaCd,
    Platform::Sega32x,
    Platform::Saturn,
    Platform::Dreamcast,
    Platform::GameGear,
    Platform::Ps1,
    Platform::Ps2,
    Platform::Psp,
    Platform::PcEngine,
    Platform::NeoGeo,
    Platform::Arcade,
];

const CD_EXTENSIONS: &[&str] = &["cue", "chd", "iso", "m3u"];

impl Platform {
    pub fn info(&self) -> &'static PlatformInfo {
        match self {
            Self::Nes => &PlatformInfo {
                short_name: "nes",
                display_name: "Nintendo Entertainment System",
                manufacturer: "Nintendo",
                aliases: &["nes", "famicom", "fc"],
                extensions: &["nes", "unf", "fds", "zip", "7z"],
            },
            Self::Snes => &PlatformInfo {
                short_name: "snes",
                display_name: "Super Nintendo",
                manufacturer: "Nintendo",
                aliases: &["snes", "sfc", "superfamicom", "super nintendo"],
                extensions: &["sfc", "smc", "fig", "swc", "zip", "7z"],
            },
            Self::N64 => &PlatformInfo {
                short_name: "n64",
                display_name: "Nintendo 64",
                manufacturer: "Nintendo",
                aliases: &["n64", "nintendo64"],
                extensions: &["z64", "n64", "v64", "zip", "7z"],
            },
            Self::GameCube => &PlatformInfo {
                short_name: "gamecube",
                display_name: "Nintendo GameCube",
                manufacturer: "Nintendo",
                aliases: &["gamecube", "gc", "ngc"],
                extensions: &["iso", "gcm", "rvz", "ciso"],
            },
            Self::Wii => &PlatformInfo {
                short_name: "wii",
                display_name: "Nintendo Wii",
                manufacturer: "Nintendo",
                aliases: &["wii"],
                extensions: &["iso", "wbfs", "rvz"],
            },
            Self::GameBoy => &PlatformInfo {
                short_name: "gb",
                display_name: "Game Boy",
                manufacturer: "Nintendo",
                aliases: &["gb", "gameboy"],
                extensions: &["gb", "zip", "7z"],
            },
            Self::GameBoyColor => &PlatformInfo {
                short_name: "gbc",
                display_name: "Game Boy Color",
                manufacturer: "Nintendo",
                aliases: &["gbc", "gameboycolor"],
                extensions: &["gbc", "gb", "zip", "7z"],
            },
            Self::Gba => &PlatformInfo {
                short_name: "gba",
                display_name: "Game Boy Advance",
                manufacturer: "Nintendo",
                aliases: &["gba", "gameboyadvance"],
                extensions: &["gba", "zip", "7z"],
            },
            Self::Ds => &PlatformInfo {
                short_name: "nds",
                display_name: "Nintendo DS",
                manufacturer: "Nintendo",
                aliases: &["nds", "ds"],
                extensions: &["nds", "zip", "7z"],
            },
            Self::Sg1000 => &PlatformInfo {
                short_name: "sg1000",
                display_name: "Sega SG-1000",
                manufacturer: "Sega",
                aliases: &["sg1000", "sg-1000"],
                extensions: &["sg", "zip", "7z"],
            },
            Self::MasterSystem => &PlatformInfo {
                short_name: "mastersystem",
                display_name: "Sega Master System",
                manufacturer: "Sega",
                aliases: &["mastersystem", "sms", "markiii"],
                extensions: &["sms", "zip", "7z"],
            },
            Self::Genesis => &PlatformInfo {
                short_name: "megadrive",
                display_name: "Sega Mega Drive / Genesis",
                manufacturer: "Sega",
                aliases: &["megadrive", "genesis", "md", "gen"],
                extensions: &["md", "gen", "bin", "smd", "zip", "7z"],
            },
            Self::SegaCd => &PlatformInfo {
                short_name: "segacd",
                display_name: "Sega CD / Mega CD",
                manufacturer: "Sega",
                aliases: &["segacd", "megacd"],
                extensions: CD_EXTENSIONS,
            },
            Self::Sega32x => &PlatformInfo {
                short_name: "sega32x",
                display_name: "Sega 32X",
                manufacturer: "Sega",
                aliases: &["sega32x", "32x"],
                extensions: &["32x", "bin", "zip", "7z"],
            },
            Self::Saturn => &PlatformInfo {
                short_name: "saturn",
                display_name: "Sega Saturn",
                manufacturer: "Sega",
                aliases: &["saturn"],
                extensions: CD_EXTENSIONS,
            },
            Self::Dreamcast => &PlatformInfo {
                short_name: "dreamcast",
                display_name: "Sega Dreamcast",
                manufacturer: "Sega",
                aliases: &["dreamcast", "dc"],
                extensions: &["cdi", "gdi", "chd", "m3u"],
            },
            Self::GameGear => &PlatformInfo {
                short_name: "gamegear",
                display_name: "Sega Game Gear",
                manufacturer: "Sega",
                aliases: &["gamegear", "gg"],
                extensions: &["gg", "zip", "7z"],
            },
            Self::Ps1 => &PlatformInfo {
                short_name: "psx",
                display_name: "Sony PlayStation",
                manufacturer: "Sony",
                aliases: &["psx", "ps1", "playstation"],
                extensions: &["cue", "chd", "pbp", "m3u", "iso"],
            },
            Self::Ps2 => &PlatformInfo {
                short_name: "ps2",
                display_name: "Sony PlayStation 2",
                manufacturer: "Sony",
                aliases: &["ps2", "playstation2"],
                extensions: &["iso", "chd", "cso"],
            },
            Self::Psp => &PlatformInfo {
                short_name: "psp",
                display_name: "Sony PlayStation Portable",
                manufacturer: "Sony",
                aliases: &["psp"],
                extensions: &["iso", "cso", "pbp"],
            },
            Self::PcEngine => &PlatformInfo {
                short_name: "pcengine",
                display_name: "NEC PC Engine / TurboGrafx-16",
                manufacturer: "NEC",
                aliases: &["pcengine", "pce", "tg16"],
                extensions: &["pce", "zip", "7z"],
            },
            Self::NeoGeo => &PlatformInfo {
                short_name: "neogeo",
                display_name: "SNK Neo Geo",
                manufacturer: "SNK",
                aliases: &["neogeo"],
                extensions: &["zip", "7z"],
            },
            Self::Arcade => &PlatformInfo {
                short_name: "mame",
                display_name: "Arcade",
                manufacturer: "Various",
                aliases: &["mame", "arcade", "fbneo"],
                extensions: &["zip", "7z"],
            },
        }
    }

    pub fn short_name(&self) -> &'static str {
        self.info().short_name
    }

    pub fn display_name(&self) -> &'static str {
        self.info().display_name
    }

    pub fn manufacturer(&self) -> &'static str {
        self.info().manufacturer
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        self.info().aliases
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        self.info().extensions
    }

    /// Whether ROM files for this system are small enough to identify by
    /// content hash. Disc images are matched by name instead.
    pub fn hashable(&self) -> bool {
        !matches!(
            self,
            Self::GameCube
                | Self::Wii
                | Self::SegaCd
                | Self::Saturn
                | Self::Dreamcast
                | Self::Ps1
                | Self::Ps2
                | Self::Psp
        )
    }

    pub fn all() -> &'static [Platform] {
        ALL_PLATFORMS
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Error returned when a string cannot be parsed into a `Platform`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown system: '{0}'")]
pub struct PlatformParseError(pub String);

impl std::str::FromStr for Platform {
    type Err = PlatformParseError;

    /// Case-insensitive match against every platform's aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ALL_PLATFORMS
            .iter()
            .copied()
            .find(|p| p.aliases().contains(&lower.as_str()))
            .ok_or_else(|| PlatformParseError(s.to_string()))
    }
}

#[cfg(test)]
#[path = "tests/platform_tests.rs"]
mod tests;
