use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::ExtractorError;

// The tail charset is ASCII-only so CJK prose glued straight onto the
// URL is never captured as part of it.
static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[A-Za-z0-9.-]+\.[A-Za-z]{2,}[-a-zA-Z0-9()@:%_+.~#?&/=]*").unwrap()
});

static DISCOVERY_PATH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/discovery/item/([A-Za-z0-9]+)").unwrap());

// Share captions often glue the URL straight onto CJK punctuation.
const TRAILING_PUNCTUATION: &[char] = &[
    '、', '，', '。', '；', '：', '！', '？', '”', '’', '」', '』', ',', '.', ';', '!', '?', ')',
];

/// Finds the first http(s) URL embedded in free text, stripping any
/// trailing punctuation the surrounding prose left attached.
pub fn extract_url(text: &str) -> Option<String> {
    let matched = URL_REGEX.find(text)?.as_str();
    let trimmed = matched.trim_end_matches(TRAILING_PUNCTUATION);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Last non-empty path segment before the query string. Generic content-id
/// fallback for URLs like `https://host/video/12345?from=share`.
pub fn extract_trailing_path_segment(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
        .map(ToOwned::to_owned)
}

/// Rewrites xiaohongshu `/discovery/item/<id>` paths to the canonical
/// `/explore/<id>` form, keeping only the query parameters the explore
/// endpoint accepts. Other URLs pass through untouched.
pub fn normalize_discovery_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };

    let Some(note_id) =
        DISCOVERY_PATH_REGEX.captures(parsed.path()).and_then(|caps| caps.get(1))
    else {
        return url.to_string();
    };

    let mut normalized = format!(
        "{}://{}/explore/{}",
        parsed.scheme(),
        parsed.host_str().unwrap_or("www.xiaohongshu.com"),
        note_id.as_str()
    );

    let kept: Vec<String> = parsed
        .query_pairs()
        .filter(|(key, _)| key == "xsec_token" || key == "xsec_source")
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    if !kept.is_empty() {
        normalized.push('?');
        normalized.push_str(&kept.join("&"));
    }

    normalized
}

#[inline]
pub fn capture_group_1<'a>(re: &Regex, input: &'a str) -> Option<&'a str> {
    re.captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[inline]
pub fn capture_group_1_or_invalid_url<'a>(
    re: &Regex,
    input: &'a str,
) -> Result<&'a str, ExtractorError> {
    capture_group_1(re, input).ok_or_else(|| ExtractorError::InvalidUrl(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_url_from_share_caption() {
        let text = "7.43 复制打开抖音，看看作品 https://v.douyin.com/iRNBho6u/ 复制此链接";
        assert_eq!(
            extract_url(text).as_deref(),
            Some("https://v.douyin.com/iRNBho6u/")
        );
    }

    #[test]
    fn strips_trailing_cjk_punctuation() {
        assert_eq!(
            extract_url("看这个 https://b23.tv/abc123，很好看").as_deref(),
            Some("https://b23.tv/abc123")
        );
        assert_eq!(
            extract_url("链接：https://www.bilibili.com/video/BV1xx411c7mD！").as_deref(),
            Some("https://www.bilibili.com/video/BV1xx411c7mD")
        );
    }

    #[test]
    fn cjk_prose_glued_to_url_is_not_captured() {
        assert_eq!(
            extract_url("https://b23.tv/abc123很好看").as_deref(),
            Some("https://b23.tv/abc123")
        );
    }

    #[test]
    fn no_url_in_plain_text() {
        assert!(extract_url("没有链接的普通文本").is_none());
        assert!(extract_url("ftp://example.com/file").is_none());
    }

    #[test]
    fn trailing_path_segment() {
        assert_eq!(
            extract_trailing_path_segment("https://www.douyin.com/video/7343529937259220274?a=1")
                .as_deref(),
            Some("7343529937259220274")
        );
        assert_eq!(
            extract_trailing_path_segment("https://v.douyin.com/iRNBho6u/").as_deref(),
            Some("iRNBho6u")
        );
    }

    #[test]
    fn discovery_path_is_rewritten() {
        let input = "https://www.xiaohongshu.com/discovery/item/64f1a2b3?xsec_token=AB12&xsec_source=pc_share&share_from=weixin";
        assert_eq!(
            normalize_discovery_url(input),
            "https://www.xiaohongshu.com/explore/64f1a2b3?xsec_token=AB12&xsec_source=pc_share"
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let input = "https://www.xiaohongshu.com/discovery/item/64f1a2b3?xsec_token=AB12";
        let once = normalize_discovery_url(input);
        assert_eq!(normalize_discovery_url(&once), once);

        let explore = "https://www.xiaohongshu.com/explore/64f1a2b3?xsec_token=AB12";
        assert_eq!(normalize_discovery_url(explore), explore);
    }

    #[test]
    fn non_discovery_urls_pass_through() {
        let input = "https://www.bilibili.com/video/BV1xx411c7mD";
        assert_eq!(normalize_discovery_url(input), input);
    }
}
