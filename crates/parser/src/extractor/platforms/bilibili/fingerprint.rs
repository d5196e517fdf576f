use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::extractor::default::DEFAULT_UA;

const PORTAL_URL: &str = "https://www.bilibili.com";

/// Device-identifier cookies (`buvid3`, `buvid4`, `b_nut`, ...) issued on
/// first contact with the portal and required by later API calls.
///
/// Fetched once per process and shared by injection; a failed fetch
/// caches the empty string so requests degrade instead of hammering the
/// portal, and `invalidate` forces a refetch.
#[derive(Default)]
pub struct FingerprintCache {
    cookie: Mutex<Option<String>>,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, client: &Client) -> String {
        let mut guard = self.cookie.lock().await;
        if let Some(cookie) = guard.as_ref() {
            return cookie.clone();
        }

        let cookie = match Self::fetch(client).await {
            Ok(cookie) => {
                debug!(len = cookie.len(), "fetched device fingerprint cookies");
                cookie
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch device fingerprint cookies");
                String::new()
            }
        };

        *guard = Some(cookie.clone());
        cookie
    }

    pub async fn invalidate(&self) {
        *self.cookie.lock().await = None;
    }

    async fn fetch(client: &Client) -> Result<String, reqwest::Error> {
        let response = client
            .get(PORTAL_URL)
            .header(reqwest::header::USER_AGENT, DEFAULT_UA)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await?;

        let mut pairs = Vec::new();
        for value in response.headers().get_all(reqwest::header::SET_COOKIE).iter() {
            if let Ok(cookie_str) = value.to_str()
                && let Some(cookie_part) = cookie_str.split(';').next()
                && cookie_part.contains('=')
            {
                pairs.push(cookie_part.trim().to_string());
            }
        }

        Ok(pairs.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::default::default_client;

    #[tokio::test]
    async fn invalidate_clears_cached_value() {
        let cache = FingerprintCache::new();
        *cache.cookie.lock().await = Some("buvid3=x".to_string());

        assert_eq!(cache.get(&default_client()).await, "buvid3=x");
        cache.invalidate().await;
        assert!(cache.cookie.lock().await.is_none());
    }
}
