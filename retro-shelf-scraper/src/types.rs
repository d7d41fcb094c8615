//! Wire types of the ScreenScraper JSON API.
//!
//! ScreenScraper serializes every number as a string and nests localized
//! values in `{region|langue, text}` arrays.

use serde::Deserialize;

/// Top-level response wrapper from jeuInfos.php.
#[derive(Debug, Deserialize)]
pub struct JeuInfosResponse {
    pub response: JeuInfosData,
}

#[derive(Debug, Deserialize)]
pub struct JeuInfosData {
    #[serde(default)]
    pub ssuser: Option<UserQuota>,
    pub jeu: GameInfo,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameInfo {
    pub id: String,
    #[serde(default)]
    pub notgame: Option<String>,
    #[serde(default)]
    pub noms: Vec<RegionText>,
    #[serde(default)]
    pub synopsis: Vec<LangueText>,
    #[serde(default)]
    pub dates: Vec<RegionText>,
    #[serde(default)]
    pub medias: Vec<Media>,
    #[serde(default)]
    pub editeur: Option<IdText>,
    #[serde(default)]
    pub developpeur: Option<IdText>,
    #[serde(default)]
    pub joueurs: Option<IdText>,
    #[serde(default)]
    pub note: Option<IdText>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub systeme: Option<IdText>,
}

fn pick_region<'a, T>(
    items: &'a [T],
    region: impl Fn(&T) -> &str,
    order: &[&str],
) -> Option<&'a T> {
    order
        .iter()
        .find_map(|want| items.iter().find(|i| region(*i) == *want))
        .or_else(|| items.first())
}

impl GameInfo {
    /// Game title for a region, then the ScreenScraper canonical name,
    /// then whatever comes first.
    pub fn name_for_region(&self, preferred: &str) -> Option<&str> {
        pick_region(&self.noms, |n| n.region.as_str(), &[preferred, "ss"]).map(|n| n.text.as_str())
    }

    /// Synopsis in a language, falling back to English.
    pub fn synopsis_for_language(&self, preferred: &str) -> Option<&str> {
        [preferred, "en"]
            .iter()
            .find_map(|lang| self.synopsis.iter().find(|s| s.langue == *lang))
            .map(|s| s.text.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn date_for_region(&self, preferred: &str) -> Option<&str> {
        pick_region(&self.dates, |d| d.region.as_str(), &[preferred, "wor"]).map(|d| d.text.as_str())
    }

    /// One media of a type (e.g. "ss", "box-2D"), preferring a region.
    pub fn media_for_region(&self, media_type: &str, preferred_region: &str) -> Option<&Media> {
        let matches: Vec<&Media> = self
            .medias
            .iter()
            .filter(|m| m.media_type == media_type)
            .collect();
        pick_region(
            &matches,
            |m| m.region.as_str(),
            &[preferred_region, "us", "wor", "ss"],
        )
        .copied()
    }

    /// Comma-joined genre names in a language.
    pub fn genre_for_language(&self, preferred: &str) -> Option<String> {
        let genres: Vec<&str> = self
            .genres
            .iter()
            .filter_map(|g| g.noms.iter().find(|n| n.langue == preferred))
            .map(|n| n.text.as_str())
            .collect();
        (!genres.is_empty()).then(|| genres.join(", "))
    }

    /// Rating as 0.0..=1.0 (ScreenScraper rates out of 20).
    pub fn rating_normalized(&self) -> Option<f32> {
        self.note
            .as_ref()
            .and_then(|n| n.text.parse::<f32>().ok())
            .map(|v| (v / 20.0).clamp(0.0, 1.0))
    }

    /// ScreenScraper system the match belongs to.
    pub fn system_id(&self) -> Option<u32> {
        self.systeme
            .as_ref()
            .and_then(|s| s.id.as_deref())
            .and_then(|id| id.parse().ok())
    }

    /// BIOS files, demos and similar entries are flagged `notgame`.
    pub fn is_not_game(&self) -> bool {
        self.notgame.as_deref() == Some("true")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegionText {
    pub region: String,
    pub text: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LangueText {
    pub langue: String,
    pub text: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdText {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Media {
    #[serde(rename = "type")]
    pub media_type: String,
    pub url: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Genre {
    #[serde(default)]
    pub noms: Vec<LangueText>,
}

/// User info response from ssuserInfos.php.
#[derive(Debug, Deserialize)]
pub struct UserInfoResponse {
    pub response: UserInfoData,
}

#[derive(Debug, Deserialize)]
pub struct UserInfoData {
    pub ssuser: UserInfo,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub maxthreads: Option<String>,
    #[serde(flatten)]
    pub quota: UserQuota,
}

impl UserInfo {
    /// Concurrent sessions the account may open.
    pub fn max_threads(&self) -> usize {
        parse_count(&self.maxthreads, 1) as usize
    }
}

/// Daily request counters, embedded in every lookup response.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct UserQuota {
    #[serde(default)]
    pub requeststoday: Option<String>,
    #[serde(default)]
    pub maxrequestsperday: Option<String>,
}

impl UserQuota {
    pub fn requests_today(&self) -> u32 {
        parse_count(&self.requeststoday, 0)
    }

    pub fn max_requests_per_day(&self) -> u32 {
        parse_count(&self.maxrequestsperday, 20000)
    }
}

fn parse_count(value: &Option<String>, default: u32) -> u32 {
    value
        .as_deref()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
