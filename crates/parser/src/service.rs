use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::error::ExtractorError;
use crate::extractor::default::{default_client, no_redirect_client};
use crate::extractor::platform_extractor::PlatformExtractor;
use crate::extractor::platforms::bilibili::Bilibili;
use crate::extractor::platforms::douyin::Douyin;
use crate::extractor::platforms::xiaohongshu::Xiaohongshu;
use crate::extractor::redirect::resolve_redirect;
use crate::extractor::utils::{extract_url, normalize_discovery_url};
use crate::media::{MediaDescriptor, Platform};
use crate::session::{CookieStatus, SessionState};

const XHS_MAX_ATTEMPTS: usize = 3;

/// The extraction pipeline's public entry point.
///
/// One instance lives for the process and is shared across requests;
/// per-request state lives in the platform extractors it constructs.
pub struct ShareParser {
    client: Client,
    redirect_client: Client,
    session: Arc<SessionState>,
}

impl ShareParser {
    pub fn new() -> Self {
        Self::with_session(Arc::new(SessionState::new()))
    }

    pub fn with_session(session: Arc<SessionState>) -> Self {
        Self {
            client: default_client(),
            redirect_client: no_redirect_client(),
            session,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn set_cookie(&self, platform: Platform, cookie: impl Into<String>) {
        self.session.set_cookie(platform, cookie);
    }

    pub fn cookie_status(&self, platform: Platform) -> CookieStatus {
        self.session.cookie_status(platform)
    }

    /// `extract(platform, input, cookie?) -> MediaDescriptor`.
    ///
    /// `input` may be a bare URL or share text with a URL embedded in
    /// prose. A cookie passed here wins over the session-configured one.
    pub async fn extract(
        &self,
        platform: Platform,
        input: &str,
        cookie: Option<String>,
    ) -> Result<MediaDescriptor, ExtractorError> {
        let url = Self::candidate_url(input)?;
        let url = self.resolve_platform_url(platform, url).await?;
        info!(%platform, %url, "extracting media");

        let cookie = cookie
            .filter(|c| !c.is_empty())
            .or_else(|| self.session.cookie(platform));

        match platform {
            Platform::Douyin => {
                let mut extractor = Douyin::new(url, self.client.clone(), cookie)?;
                extractor.get_video_info().await
            }
            Platform::Bilibili => {
                let mut extractor = Bilibili::new(
                    url,
                    self.client.clone(),
                    cookie,
                    self.session.fingerprint(),
                );
                extractor.get_video_info().await
            }
            Platform::Xiaohongshu => self.extract_xiaohongshu(url, cookie).await,
        }
    }

    fn candidate_url(input: &str) -> Result<String, ExtractorError> {
        if let Some(url) = extract_url(input) {
            return Ok(url);
        }
        let trimmed = input.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Ok(trimmed.to_string());
        }
        Err(ExtractorError::NoUrlFound)
    }

    /// Expand short links toward the platform's canonical host and apply
    /// platform path normalization.
    async fn resolve_platform_url(
        &self,
        platform: Platform,
        url: String,
    ) -> Result<String, ExtractorError> {
        let resolved = match platform {
            Platform::Douyin => {
                let is_canonical =
                    url.contains("douyin.com/video") || url.contains("douyin.com/note");
                if is_canonical {
                    url
                } else {
                    resolve_redirect(&self.redirect_client, &url, Some("douyin.com")).await
                }
            }
            Platform::Bilibili => {
                if url.contains("b23.tv") {
                    resolve_redirect(&self.redirect_client, &url, Some("bilibili.com")).await
                } else {
                    url
                }
            }
            Platform::Xiaohongshu => {
                let expanded = if url.contains("xhslink.com") {
                    resolve_redirect(&self.redirect_client, &url, Some("xiaohongshu.com")).await
                } else if url.contains("xiaohongshu.com") {
                    url
                } else {
                    return Err(ExtractorError::UnsupportedLinkFormat(url));
                };
                normalize_discovery_url(&expanded)
            }
        };
        debug!(%platform, %resolved, "resolved content url");
        Ok(resolved)
    }

    /// The page sometimes serves an empty shell on the first hit, so the
    /// whole extraction is retried. A missing-cookie outcome is not
    /// transient and fails fast instead of burning attempts.
    async fn extract_xiaohongshu(
        &self,
        url: String,
        cookie: Option<String>,
    ) -> Result<MediaDescriptor, ExtractorError> {
        let mut last_error = ExtractorError::NoMediaFound;

        for attempt in 1..=XHS_MAX_ATTEMPTS {
            let mut extractor =
                Xiaohongshu::new(url.clone(), self.client.clone(), cookie.clone());
            match extractor.get_video_info().await {
                Ok(descriptor) => return Ok(descriptor),
                Err(e @ ExtractorError::UpstreamAuthRequired(_)) => return Err(e),
                Err(e) => {
                    warn!(attempt, error = %e, "xiaohongshu extraction attempt failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

impl Default for ShareParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_url_from_share_text() {
        assert_eq!(
            ShareParser::candidate_url("看看 https://b23.tv/abc 吧").unwrap(),
            "https://b23.tv/abc"
        );
        assert_eq!(
            ShareParser::candidate_url("  https://www.douyin.com/video/1  ").unwrap(),
            "https://www.douyin.com/video/1"
        );
        assert!(matches!(
            ShareParser::candidate_url("没有链接"),
            Err(ExtractorError::NoUrlFound)
        ));
    }

    #[tokio::test]
    async fn canonical_urls_skip_redirect_resolution() {
        let parser = ShareParser::new();
        let url = "https://www.douyin.com/video/7343529937259220274".to_string();
        assert_eq!(
            parser
                .resolve_platform_url(Platform::Douyin, url.clone())
                .await
                .unwrap(),
            url
        );

        let url = "https://www.bilibili.com/video/BV1xx411c7mD".to_string();
        assert_eq!(
            parser
                .resolve_platform_url(Platform::Bilibili, url.clone())
                .await
                .unwrap(),
            url
        );
    }

    #[tokio::test]
    async fn xiaohongshu_discovery_path_normalized() {
        let parser = ShareParser::new();
        let url = "https://www.xiaohongshu.com/discovery/item/64f1a2b3?xsec_token=T".to_string();
        assert_eq!(
            parser
                .resolve_platform_url(Platform::Xiaohongshu, url)
                .await
                .unwrap(),
            "https://www.xiaohongshu.com/explore/64f1a2b3?xsec_token=T"
        );
    }

    #[tokio::test]
    async fn foreign_hosts_rejected_for_xiaohongshu() {
        let parser = ShareParser::new();
        let err = parser
            .resolve_platform_url(
                Platform::Xiaohongshu,
                "https://example.com/explore/1".to_string(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractorError::UnsupportedLinkFormat(_)));
    }
}
