use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::extractor::platforms::bilibili::FingerprintCache;
use crate::media::Platform;

/// Cookie configuration snapshot, safe to expose to callers.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CookieStatus {
    pub configured: bool,
    pub preview: String,
}

/// Process-wide mutable configuration, owned by the hosting server and
/// injected into the parser at construction.
///
/// Cookies are read-many/write-rare with last-write-wins semantics; a
/// write racing an in-flight extraction is acceptable.
#[derive(Default)]
pub struct SessionState {
    bilibili_cookie: RwLock<String>,
    xiaohongshu_cookie: RwLock<String>,
    fingerprint: Arc<FingerprintCache>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cookie(&self, platform: Platform, cookie: impl Into<String>) {
        match platform {
            Platform::Bilibili => *self.bilibili_cookie.write() = cookie.into(),
            Platform::Xiaohongshu => *self.xiaohongshu_cookie.write() = cookie.into(),
            // No session cookie is carried for douyin.
            Platform::Douyin => {}
        }
    }

    pub fn cookie(&self, platform: Platform) -> Option<String> {
        let cookie = match platform {
            Platform::Bilibili => self.bilibili_cookie.read().clone(),
            Platform::Xiaohongshu => self.xiaohongshu_cookie.read().clone(),
            Platform::Douyin => return None,
        };
        (!cookie.is_empty()).then_some(cookie)
    }

    pub fn cookie_status(&self, platform: Platform) -> CookieStatus {
        let cookie = self.cookie(platform).unwrap_or_default();
        let preview = if cookie.chars().count() > 50 {
            let head: String = cookie.chars().take(50).collect();
            format!("{head}...")
        } else {
            cookie.clone()
        };
        CookieStatus {
            configured: !cookie.is_empty(),
            preview,
        }
    }

    pub(crate) fn fingerprint(&self) -> Arc<FingerprintCache> {
        self.fingerprint.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_roundtrip_and_status() {
        let session = SessionState::new();
        assert!(session.cookie(Platform::Bilibili).is_none());

        session.set_cookie(Platform::Bilibili, "SESSDATA=abc");
        assert_eq!(
            session.cookie(Platform::Bilibili).as_deref(),
            Some("SESSDATA=abc")
        );

        let status = session.cookie_status(Platform::Bilibili);
        assert!(status.configured);
        assert_eq!(status.preview, "SESSDATA=abc");
    }

    #[test]
    fn long_cookie_preview_is_truncated() {
        let session = SessionState::new();
        session.set_cookie(Platform::Xiaohongshu, "x".repeat(80));

        let status = session.cookie_status(Platform::Xiaohongshu);
        assert_eq!(status.preview.len(), 53);
        assert!(status.preview.ends_with("..."));
    }

    #[test]
    fn douyin_carries_no_cookie() {
        let session = SessionState::new();
        session.set_cookie(Platform::Douyin, "ignored=1");
        assert!(session.cookie(Platform::Douyin).is_none());
        assert!(!session.cookie_status(Platform::Douyin).configured);
    }

    #[test]
    fn last_write_wins() {
        let session = SessionState::new();
        session.set_cookie(Platform::Bilibili, "a=1");
        session.set_cookie(Platform::Bilibili, "b=2");
        assert_eq!(session.cookie(Platform::Bilibili).as_deref(), Some("b=2"));
    }
}
