use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use rustc_hash::FxHashMap;
use std::str::FromStr;
use tracing::debug;

use super::default::DEFAULT_UA;
use crate::error::ExtractorError;
use crate::media::MediaDescriptor;

/// Base extractor shared by all platforms.
///
/// Each extractor instance owns its cookie store and header set, so
/// per-request session state never leaks between extractions. Instances
/// are created per request and discarded after one `get_video_info`
/// call returns.
#[derive(Debug, Clone)]
pub struct Extractor {
    /// The (already redirect-resolved) content URL to extract from.
    pub url: String,
    pub platform_name: String,
    pub client: Client,
    platform_headers: HeaderMap,
    pub cookies: FxHashMap<String, String>,
}

impl Extractor {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        platform_name: S1,
        url: S2,
        client: Client,
    ) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(DEFAULT_UA),
        );
        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        default_headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.8,en-US;q=0.5,en;q=0.3"),
        );
        // No Accept-Encoding here. Reqwest adds it and transparently
        // decompresses as long as the header is not overridden.

        Self {
            platform_name: platform_name.into(),
            url: url.into(),
            client,
            platform_headers: default_headers,
            cookies: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn set_referer_static(&mut self, referer: &'static str) {
        self.platform_headers
            .insert(reqwest::header::REFERER, HeaderValue::from_static(referer));
    }

    #[inline]
    pub fn set_origin_and_referer_static(&mut self, base_url: &'static str) {
        let v = HeaderValue::from_static(base_url);
        self.platform_headers.insert(reqwest::header::ORIGIN, v.clone());
        self.platform_headers.insert(reqwest::header::REFERER, v);
    }

    pub fn add_header_str<K: AsRef<str>, V: AsRef<str>>(&mut self, key: K, value: V) {
        match HeaderName::from_str(key.as_ref()) {
            Ok(name) => match HeaderValue::from_str(value.as_ref()) {
                Ok(value) => {
                    self.platform_headers.insert(name, value);
                }
                Err(e) => {
                    debug!(error = %e, "Invalid header value; skipping");
                }
            },
            Err(e) => {
                debug!(error = %e, "Invalid header name; skipping");
            }
        }
    }

    pub fn add_cookie<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.cookies.insert(name.into(), value.into());
    }

    /// Import cookies from a raw `name1=value1; name2=value2` string, as
    /// copied from a browser or supplied by a caller.
    pub fn set_cookies_from_string(&mut self, cookie_string: &str) {
        for part in cookie_string.split(&[';', '\n'][..]).map(str::trim) {
            if part.is_empty() {
                continue;
            }

            let Some((name, value)) = part.split_once('=') else {
                continue;
            };
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                continue;
            }

            self.cookies.insert(name.to_owned(), value.to_owned());
        }
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    fn build_cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        let mut cookie_string = String::with_capacity(
            self.cookies
                .iter()
                .map(|(k, v)| k.len() + 1 + v.len() + 2)
                .sum(),
        );

        for (name, value) in &self.cookies {
            if !cookie_string.is_empty() {
                cookie_string.push_str("; ");
            }
            cookie_string.push_str(name);
            cookie_string.push('=');
            cookie_string.push_str(value);
        }

        Some(cookie_string)
    }

    /// Store cookies from response `Set-Cookie` headers into this
    /// instance's cookie store.
    pub fn parse_and_store_cookies(&mut self, headers: &HeaderMap) {
        for value in headers.get_all(reqwest::header::SET_COOKIE).iter() {
            if let Ok(cookie_str) = value.to_str()
                && let Some(cookie_part) = cookie_str.split(';').next()
                && let Some((name, value)) = cookie_part.split_once('=')
            {
                let name = name.trim();
                let value = value.trim();
                if name.is_empty() || value.is_empty() {
                    continue;
                }
                self.cookies.insert(name.to_owned(), value.to_owned());
            }
        }
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Build a request with platform headers and stored cookies attached.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut headers = self.platform_headers.clone();

        if let Some(cookie_header) = self.build_cookie_header() {
            match HeaderValue::from_str(&cookie_header) {
                Ok(value) => {
                    headers.insert(reqwest::header::COOKIE, value);
                }
                Err(e) => {
                    // Malformed cookie values are dropped rather than sent.
                    debug!(error = %e, "Failed to build Cookie header");
                }
            }
        }

        self.client.request(method, url).headers(headers)
    }

    pub fn get_platform_headers(&self) -> &HeaderMap {
        &self.platform_headers
    }

    /// Owned header snapshot for `MediaDescriptor::download_headers`, so
    /// callers know what to send when fetching the returned stream URLs.
    pub fn download_headers(&self) -> std::collections::BTreeMap<String, String> {
        let mut map = std::collections::BTreeMap::new();
        for (key, value) in &self.platform_headers {
            if let Ok(value) = value.to_str() {
                map.insert(key.as_str().to_owned(), value.to_owned());
            }
        }
        map
    }
}

#[async_trait]
pub trait PlatformExtractor: Send + Sync {
    fn get_extractor(&self) -> &Extractor;

    /// Run the full extraction pipeline for this instance's URL and map
    /// the upstream payload into the normalized descriptor.
    async fn get_video_info(&mut self) -> Result<MediaDescriptor, ExtractorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::default::default_client;

    #[test]
    fn cookie_string_parsing() {
        let mut extractor = Extractor::new("Test", "https://example.com", default_client());
        extractor.set_cookies_from_string("SESSDATA=abc123; buvid3=xyz; ; bad_part");
        assert_eq!(extractor.cookies.get("SESSDATA").map(String::as_str), Some("abc123"));
        assert_eq!(extractor.cookies.get("buvid3").map(String::as_str), Some("xyz"));
        assert_eq!(extractor.cookies.len(), 2);
    }

    #[test]
    fn cookie_header_roundtrip() {
        let mut extractor = Extractor::new("Test", "https://example.com", default_client());
        extractor.add_cookie("a", "1");
        let header = extractor.build_cookie_header().unwrap();
        assert_eq!(header, "a=1");
    }

    #[test]
    fn download_headers_include_defaults() {
        let mut extractor = Extractor::new("Test", "https://example.com", default_client());
        extractor.set_referer_static("https://www.douyin.com/");
        let headers = extractor.download_headers();
        assert!(headers.contains_key("user-agent"));
        assert_eq!(
            headers.get("referer").map(String::as_str),
            Some("https://www.douyin.com/")
        );
    }
}
