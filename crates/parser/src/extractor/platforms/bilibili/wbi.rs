use std::time::{SystemTime, UNIX_EPOCH};

use md5::{Digest, Md5};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::extractor::default::DEFAULT_UA;

const NAV_API: &str = "https://api.bilibili.com/x/web-interface/nav";

// Published constant permutation; order-sensitive, reproduced byte-exact.
const MIXIN_KEY_ENC_TAB: [usize; 64] = [
    46, 47, 18, 2, 53, 8, 23, 32, 15, 50, 10, 31, 58, 3, 45, 35, 27, 43, 5, 49, 33, 9, 42, 19, 29,
    28, 14, 39, 12, 38, 41, 13, 37, 48, 7, 16, 24, 55, 40, 61, 26, 17, 0, 1, 60, 51, 30, 4, 22, 25,
    54, 21, 56, 59, 6, 63, 57, 62, 11, 36, 20, 34, 44, 52,
];

#[derive(Deserialize)]
struct WbiImg {
    img_url: String,
    sub_url: String,
}

#[derive(Deserialize)]
struct NavData {
    wbi_img: WbiImg,
}

#[derive(Deserialize)]
struct NavResponse {
    data: NavData,
}

/// Permute the concatenated keys through the substitution table and take
/// the first 32 characters. Empty or short inputs yield an empty mixin
/// key, which downgrades signing to an unsigned query.
fn get_mixin_key(img_key: &str, sub_key: &str) -> String {
    if img_key.is_empty() || sub_key.is_empty() {
        return String::new();
    }
    let orig = format!("{img_key}{sub_key}");
    let bytes = orig.as_bytes();
    if bytes.len() < 64 {
        return String::new();
    }
    MIXIN_KEY_ENC_TAB
        .iter()
        .take(32)
        .map(|&i| bytes[i] as char)
        .collect()
}

fn get_url_encoded(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            // Unreserved characters that do not need to be encoded.
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '~' => {
                encoded.push(c);
            }
            // Filtered out entirely, a quirk of the scheme.
            '!' | '\'' | '(' | ')' | '*' => {}
            _ => {
                let mut buf = [0; 4];
                for b in c.encode_utf8(&mut buf).bytes() {
                    encoded.push_str(&format!("%{b:02X}"));
                }
            }
        }
    }
    encoded
}

/// Pure signing step: inject `wts`, sort lexicographically, percent-encode
/// and append `w_rid` when a mixin key is available. With no usable keys
/// the unsigned query is returned as the degraded path.
pub fn signed_query(
    mut params: Vec<(&str, String)>,
    (img_key, sub_key): (&str, &str),
    timestamp: u64,
) -> String {
    let mixin_key = get_mixin_key(img_key, sub_key);

    params.push(("wts", timestamp.to_string()));
    params.sort_by(|a, b| a.0.cmp(b.0));

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", get_url_encoded(k), get_url_encoded(v)))
        .collect::<Vec<_>>()
        .join("&");

    if mixin_key.is_empty() {
        warn!("wbi mixin key unavailable, sending unsigned query");
        return query;
    }

    let mut hasher = Md5::new();
    hasher.update(query.as_bytes());
    hasher.update(mixin_key.as_bytes());
    let w_rid = format!("{:x}", hasher.finalize());

    format!("{query}&w_rid={w_rid}")
}

fn take_filename(url: &str) -> Option<String> {
    url.rsplit_once('/')
        .and_then(|(_, s)| s.rsplit_once('.'))
        .map(|(s, _)| s.to_string())
}

/// Signs play-address queries. Keys are fetched lazily and cached for
/// this instance's lifetime only; each extraction gets a fresh signer.
pub struct WbiSigner {
    client: Client,
    cookie_header: Option<String>,
    keys: Option<(String, String)>,
}

impl WbiSigner {
    pub fn new(client: Client, cookie_header: Option<String>) -> Self {
        Self {
            client,
            cookie_header,
            keys: None,
        }
    }

    /// Sign `params` with the instance's keys, fetching them on first use.
    pub async fn sign(&mut self, params: Vec<(&str, String)>) -> String {
        let (img_key, sub_key) = self.keys().await;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        signed_query(params, (&img_key, &sub_key), timestamp)
    }

    async fn keys(&mut self) -> (String, String) {
        if let Some(keys) = &self.keys {
            return keys.clone();
        }

        let keys = match self.fetch_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "failed to fetch wbi keys, degrading to unsigned requests");
                (String::new(), String::new())
            }
        };
        self.keys = Some(keys.clone());
        keys
    }

    async fn fetch_keys(&self) -> Result<(String, String), reqwest::Error> {
        let mut request = self
            .client
            .get(NAV_API)
            .header(reqwest::header::USER_AGENT, DEFAULT_UA)
            .header(reqwest::header::REFERER, "https://www.bilibili.com/");
        if let Some(cookie) = &self.cookie_header {
            request = request.header(reqwest::header::COOKIE, cookie);
        }

        let nav: NavResponse = request.send().await?.json().await?;

        let img_key = take_filename(&nav.data.wbi_img.img_url).unwrap_or_default();
        let sub_key = take_filename(&nav.data.wbi_img.sub_url).unwrap_or_default();

        // Stems shorter than 32 chars mean the endpoint handed back junk.
        if img_key.len() < 32 || sub_key.len() < 32 {
            warn!(
                img_len = img_key.len(),
                sub_len = sub_key.len(),
                "wbi key stems too short, treating as unavailable"
            );
            return Ok((String::new(), String::new()));
        }

        Ok((img_key, sub_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMG_KEY: &str = "7cd084941338484aae1ad9425b84077c";
    const SUB_KEY: &str = "4932caff0ff746eab6f01bf08b70ac45";

    #[test]
    fn take_filename_from_asset_url() {
        assert_eq!(
            take_filename("https://i0.hdslb.com/bfs/wbi/7cd084941338484aae1ad9425b84077c.png"),
            Some("7cd084941338484aae1ad9425b84077c".to_string())
        );
    }

    #[test]
    fn mixin_key_matches_published_fixture() {
        assert_eq!(
            get_mixin_key(IMG_KEY, SUB_KEY),
            "ea1db124af3c7062474693fa704f4ff8"
        );
    }

    #[test]
    fn mixin_key_empty_on_short_keys() {
        assert_eq!(get_mixin_key("short", "keys"), "");
        assert_eq!(get_mixin_key("", SUB_KEY), "");
    }

    #[test]
    fn signed_query_matches_published_fixture() {
        let params = vec![
            ("foo", String::from("114")),
            ("bar", String::from("514")),
            ("zab", String::from("1919810")),
        ];
        assert_eq!(
            signed_query(params, (IMG_KEY, SUB_KEY), 1702204169),
            "bar=514&foo=114&wts=1702204169&zab=1919810&w_rid=8f6f2b5b3d485fe1886cec6a0be8c5d4"
        );
    }

    #[test]
    fn resigning_parsed_query_reproduces_w_rid() {
        let params = vec![("avid", String::from("1")), ("cid", String::from("2"))];
        let first = signed_query(params, (IMG_KEY, SUB_KEY), 1702204169);

        let (query, w_rid) = first.rsplit_once("&w_rid=").unwrap();
        let reparsed: Vec<(&str, String)> = query
            .split('&')
            .filter(|kv| !kv.starts_with("wts="))
            .map(|kv| {
                let (k, v) = kv.split_once('=').unwrap();
                (k, v.to_string())
            })
            .collect();

        let second = signed_query(reparsed, (IMG_KEY, SUB_KEY), 1702204169);
        assert!(second.ends_with(w_rid));
    }

    #[test]
    fn unsigned_query_without_keys() {
        let params = vec![("foo", String::from("ba!r"))];
        let query = signed_query(params, ("", ""), 1);
        assert_eq!(query, "foo=bar&wts=1");
    }

    #[test]
    fn filtered_characters_removed_before_encoding() {
        assert_eq!(get_url_encoded("a'b(c)*!d"), "abcd");
        assert_eq!(get_url_encoded("中"), "%E4%B8%AD");
    }
}
