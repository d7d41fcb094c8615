use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::Credentials;
use crate::error::ScrapeError;
use crate::types::{JeuInfosResponse, UserInfo, UserInfoResponse, UserQuota};

const BASE_URL: &str = "https://api.screenscraper.fr/api2";
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1200);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// State shared by every session of one account.
#[derive(Debug, Default)]
struct AccountState {
    quota: Mutex<Option<UserQuota>>,
    quota_reached: AtomicBool,
}

/// Blocking HTTP session with the ScreenScraper API.
///
/// One session is one concurrent connection slot: it rate-limits its own
/// requests. Sessions created with [`fork`](Self::fork) share the HTTP
/// connection pool and the account quota, so once the daily quota is hit
/// every session fails fast.
#[derive(Debug)]
pub struct ScreenScraperClient {
    http: reqwest::blocking::Client,
    creds: Arc<Credentials>,
    account: Arc<AccountState>,
    last_request: Mutex<Option<Instant>>,
}

impl ScreenScraperClient {
    /// Create a client and validate credentials by calling ssuserInfos.php.
    pub fn connect(creds: Credentials) -> Result<(Self, UserInfo), ScrapeError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let client = Self {
            http,
            creds: Arc::new(creds),
            account: Arc::new(AccountState::default()),
            last_request: Mutex::new(None),
        };
        let user_info = client.get_user_info()?;
        Ok((client, user_info))
    }

    /// Open another session on the same account.
    pub fn fork(&self) -> Self {
        Self {
            http: self.http.clone(),
            creds: self.creds.clone(),
            account: self.account.clone(),
            last_request: Mutex::new(None),
        }
    }

    /// Get user info and quota from ssuserInfos.php.
    fn get_user_info(&self) -> Result<UserInfo, ScrapeError> {
        let mut params = self.base_params();
        params.insert("output", "json".to_string());

        self.rate_limit();

        let resp = self
            .http
            .get(format!("{}/ssuserInfos.php", BASE_URL))
            .query(&params)
            .send()?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ScrapeError::InvalidCredentials(
                "Invalid developer or user credentials".to_string(),
            ));
        }

        let text = resp.text()?;
        let info: UserInfoResponse = serde_json::from_str(&text).map_err(|e| {
            ScrapeError::Api(format!(
                "Failed to parse user info: {e}. Response: {}",
                truncate(&text)
            ))
        })?;

        Ok(info.response.ssuser)
    }

    /// Look up a game by various parameters.
    pub fn lookup_game(
        &self,
        params: HashMap<&'static str, String>,
    ) -> Result<JeuInfosResponse, ScrapeError> {
        self.ensure_quota()?;

        let mut all_params = self.base_params();
        all_params.insert("output", "json".to_string());
        all_params.extend(params);

        self.rate_limit();

        let resp = self
            .http
            .get(format!("{}/jeuInfos.php", BASE_URL))
            .query(&all_params)
            .send()?;

        let status = resp.status();
        let text = resp.text()?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ScrapeError::InvalidCredentials(
                "Credentials rejected".to_string(),
            ));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ScrapeError::RateLimit);
        }
        if let Some(err) = classify_body(&text) {
            if matches!(err, ScrapeError::QuotaExceeded { .. }) {
                self.account.quota_reached.store(true, Ordering::SeqCst);
                return Err(self.quota_error());
            }
            return Err(err);
        }
        if status.is_server_error() {
            return Err(ScrapeError::ServerError {
                status: status.as_u16(),
                message: truncate(&text).to_string(),
            });
        }

        let response: JeuInfosResponse = serde_json::from_str(&text).map_err(|e| {
            ScrapeError::Api(format!(
                "Failed to parse game info: {e}. Response: {}",
                truncate(&text)
            ))
        })?;

        if let Some(ref user) = response.response.ssuser {
            if user.requests_today() >= user.max_requests_per_day() {
                log::warn!(
                    "ScreenScraper daily quota reached ({}/{})",
                    user.requests_today(),
                    user.max_requests_per_day()
                );
                self.account.quota_reached.store(true, Ordering::SeqCst);
            }
            *self.account.quota.lock().unwrap_or_else(PoisonError::into_inner) = Some(user.clone());
        }

        Ok(response)
    }

    /// Download a media file. CDN downloads don't count against the API
    /// rate limit.
    pub fn download_media(&self, url: &str) -> Result<Vec<u8>, ScrapeError> {
        let resp = self.http.get(url).send()?.error_for_status()?;
        Ok(resp.bytes()?.to_vec())
    }

    /// Latest quota info seen by any session of this account.
    pub fn current_quota(&self) -> Option<UserQuota> {
        self.account
            .quota
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn quota_reached(&self) -> bool {
        self.account.quota_reached.load(Ordering::SeqCst)
    }

    /// Fail fast once any session of the account has hit the daily quota.
    pub fn ensure_quota(&self) -> Result<(), ScrapeError> {
        if self.quota_reached() {
            return Err(self.quota_error());
        }
        Ok(())
    }

    fn quota_error(&self) -> ScrapeError {
        let (used, max) = self
            .current_quota()
            .map(|q| (q.requests_today(), q.max_requests_per_day()))
            .unwrap_or((0, 0));
        ScrapeError::QuotaExceeded { used, max }
    }

    /// Sleep until at least MIN_REQUEST_INTERVAL has passed since this
    /// session's previous API request.
    fn rate_limit(&self) {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(elapsed) = last.map(|t| t.elapsed()) {
            if elapsed < MIN_REQUEST_INTERVAL {
                std::thread::sleep(MIN_REQUEST_INTERVAL - elapsed);
            }
        }
        *last = Some(Instant::now());
    }

    fn base_params(&self) -> HashMap<&'static str, String> {
        let mut params = HashMap::new();
        params.insert("devid", self.creds.dev_id.clone());
        params.insert("devpassword", self.creds.dev_password.clone());
        params.insert("softname", self.creds.soft_name.clone());
        if let Some(ref id) = self.creds.user_id {
            params.insert("ssid", id.clone());
        }
        if let Some(ref pw) = self.creds.user_password {
            params.insert("sspassword", pw.clone());
        }
        params
    }
}

/// ScreenScraper answers HTTP 200 with a plain-text error for several
/// conditions; map those bodies to errors.
fn classify_body(text: &str) -> Option<ScrapeError> {
    if text.trim().is_empty() || text.contains("Erreur") || text.contains("Jeu non trouvé") {
        return Some(ScrapeError::not_found());
    }
    if text.contains("API fermé") || text.contains("API closed") {
        return Some(ScrapeError::ServerClosed(
            "ScreenScraper API is temporarily closed".to_string(),
        ));
    }
    if text.contains("Le quota de scrape journalier") {
        return Some(ScrapeError::QuotaExceeded { used: 0, max: 0 });
    }
    None
}

fn truncate(text: &str) -> &str {
    let mut end = text.len().min(200);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_bodies_are_classified() {
        assert!(matches!(classify_body(""), Some(ScrapeError::NotFound { .. })));
        assert!(matches!(
            classify_body("Erreur : Rom/Iso/Dossier non trouvée !"),
            Some(ScrapeError::NotFound { .. })
        ));
        assert!(matches!(
            classify_body("API closed for non-members"),
            Some(ScrapeError::ServerClosed(_))
        ));
        assert!(matches!(
            classify_body("Le quota de scrape journalier est dépassé"),
            Some(ScrapeError::QuotaExceeded { .. })
        ));
        assert!(classify_body(r#"{"response":{}}"#).is_none());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "é".repeat(150);
        let cut = truncate(&text);
        assert!(cut.len() <= 200);
        assert!(cut.chars().all(|c| c == 'é'));
    }
}
