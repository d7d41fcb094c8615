use serde::{Deserialize, Serialize};

/// Release region of a game, as reported by the metadata provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Japan,
    Usa,
    Europe,
    Australia,
    Korea,
    China,
    Taiwan,
    Brazil,
    World,
}

impl Region {
    /// Two or three letter code used by ScreenScraper (`noms[].region`,
    /// `medias[].region`).
    pub fn ss_code(&self) -> &'static str {
        match self {
            Self::Japan => "jp",
            Self::Usa => "us",
            Self::Europe => "eu",
            Self::Australia => "au",
            Self::Korea => "kr",
            Self::China => "cn",
            Self::Taiwan => "tw",
            Self::Brazil => "br",
            Self::World => "wor",
        }
    }

    /// Parse a ScreenScraper region code. Country codes that fold into a
    /// wider release region (`fr`, `de`, `uk`, ...) map onto it.
    pub fn from_ss_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "jp" => Some(Self::Japan),
            "us" | "ame" | "ca" => Some(Self::Usa),
            "eu" | "fr" | "de" | "uk" | "it" | "sp" | "nl" | "se" => Some(Self::Europe),
            "au" => Some(Self::Australia),
            "kr" => Some(Self::Korea),
            "cn" => Some(Self::China),
            "tw" => Some(Self::Taiwan),
            "br" => Some(Self::Brazil),
            "wor" | "ss" => Some(Self::World),
            _ => None,
        }
    }

    /// Likely language of descriptions for this region.
    pub fn language(&self) -> &'static str {
        match self {
            Self::Japan => "ja",
            Self::Korea => "ko",
            Self::China | Self::Taiwan => "zh",
            Self::Brazil => "pt",
            Self::Usa | Self::Europe | Self::Australia | Self::World => "en",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Japan => "Japan",
            Self::Usa => "USA",
            Self::Europe => "Europe",
            Self::Australia => "Australia",
            Self::Korea => "Korea",
            Self::China => "China",
            Self::Taiwan => "Taiwan",
            Self::Brazil => "Brazil",
            Self::World => "World",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_codes_fold_into_release_regions() {
        assert_eq!(Region::from_ss_code("fr"), Some(Region::Europe));
        assert_eq!(Region::from_ss_code("US"), Some(Region::Usa));
        assert_eq!(Region::from_ss_code("ss"), Some(Region::World));
        assert_eq!(Region::from_ss_code("xx"), None);
    }

    #[test]
    fn ss_code_parses_back() {
        for region in [Region::Japan, Region::Usa, Region::Europe, Region::World] {
            assert_eq!(Region::from_ss_code(region.ss_code()), Some(region));
        }
    }
}
