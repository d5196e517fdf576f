use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use super::extras::{BilibiliExtras, DouyinExtras, XiaohongshuExtras};
use super::format::format_count;
use super::stream::{AudioStream, StreamVariant};

/// Supported platforms.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Douyin,
    Bilibili,
    Xiaohongshu,
}

impl Platform {
    /// Guess the platform from a URL or share text by host markers.
    pub fn detect(text: &str) -> Option<Self> {
        if text.contains("douyin.com") || text.contains("iesdouyin.com") {
            Some(Platform::Douyin)
        } else if text.contains("bilibili.com") || text.contains("b23.tv") {
            Some(Platform::Bilibili)
        } else if text.contains("xiaohongshu.com") || text.contains("xhslink.com") {
            Some(Platform::Xiaohongshu)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Douyin => "douyin",
            Platform::Bilibili => "bilibili",
            Platform::Xiaohongshu => "xiaohongshu",
        }
    }

    /// Referer expected by the platform's CDN when fetching media bytes.
    pub fn referer(&self) -> &'static str {
        match self {
            Platform::Douyin => "https://www.douyin.com/",
            Platform::Bilibili => "https://www.bilibili.com/",
            Platform::Xiaohongshu => "https://www.xiaohongshu.com/",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "douyin" => Ok(Platform::Douyin),
            "bilibili" => Ok(Platform::Bilibili),
            "xiaohongshu" | "xhs" => Ok(Platform::Xiaohongshu),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    pub id: String,
    pub avatar_url: String,
}

/// A counter carried both raw and in the platform's abbreviated form.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatCounter {
    pub raw: u64,
    pub formatted: String,
}

impl StatCounter {
    pub fn of(raw: u64) -> Self {
        Self {
            raw,
            formatted: format_count(raw),
        }
    }

    /// For upstreams that only hand out pre-formatted strings: keep the
    /// string as-is and back-fill the raw value when it is plain digits.
    pub fn from_display(formatted: &str) -> Self {
        Self {
            raw: formatted.parse().unwrap_or(0),
            formatted: formatted.to_string(),
        }
    }
}

/// Publish time, formatted plus raw epoch seconds.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Timestamp {
    pub formatted: String,
    pub epoch: i64,
}

impl Timestamp {
    pub fn from_epoch_secs(epoch: i64) -> Self {
        let formatted = if epoch > 0 {
            Local
                .timestamp_opt(epoch, 0)
                .single()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default()
        } else {
            String::new()
        };
        Self { formatted, epoch }
    }
}

/// The normalized extraction result shared by all platforms.
///
/// Platform-specific extras live in optional nested structures rather
/// than flattened keys, so the three upstream shapes cannot collide.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    pub platform: Platform,
    /// Platform-native content id (aweme id, bvid, note id).
    pub id: String,
    pub title: String,
    pub description: String,
    pub cover_url: String,
    pub author: Author,
    /// Named counters (views/likes/comments/...), raw plus formatted.
    pub stats: BTreeMap<String, StatCounter>,
    pub video_streams: Vec<StreamVariant>,
    pub audio_stream: Option<AudioStream>,
    /// Populated for image "note" content; empty for plain video.
    pub images: Vec<String>,
    /// Seconds.
    pub duration: u64,
    pub width: u32,
    pub height: u32,
    /// `WxH`, empty when unknown.
    pub dimension: String,
    pub is_note: bool,
    pub created_at: Timestamp,
    /// Headers a downloader must send when fetching the stream URLs.
    pub download_headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub douyin: Option<DouyinExtras>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bilibili: Option<BilibiliExtras>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xiaohongshu: Option<XiaohongshuExtras>,
}

impl MediaDescriptor {
    pub fn new(platform: Platform, id: impl Into<String>) -> Self {
        Self {
            platform,
            id: id.into(),
            title: String::new(),
            description: String::new(),
            cover_url: String::new(),
            author: Author::default(),
            stats: BTreeMap::new(),
            video_streams: Vec::new(),
            audio_stream: None,
            images: Vec::new(),
            duration: 0,
            width: 0,
            height: 0,
            dimension: String::new(),
            is_note: false,
            created_at: Timestamp::default(),
            download_headers: BTreeMap::new(),
            douyin: None,
            bilibili: None,
            xiaohongshu: None,
        }
    }

    /// Whether the extraction yielded anything a client can play or show.
    pub fn has_media(&self) -> bool {
        !self.video_streams.is_empty() || !self.images.is_empty()
    }

    pub fn set_dimension(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.dimension = if width > 0 && height > 0 {
            format!("{width}x{height}")
        } else {
            String::new()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_detection_from_hosts() {
        assert_eq!(
            Platform::detect("https://v.douyin.com/abc/"),
            Some(Platform::Douyin)
        );
        assert_eq!(
            Platform::detect("看看这个 https://b23.tv/xyz 很棒"),
            Some(Platform::Bilibili)
        );
        assert_eq!(
            Platform::detect("http://xhslink.com/m/844vKmW30jz"),
            Some(Platform::Xiaohongshu)
        );
        assert_eq!(Platform::detect("https://example.com/v/1"), None);
    }

    #[test]
    fn stat_counter_from_display_parses_plain_digits() {
        let s = StatCounter::from_display("1234");
        assert_eq!(s.raw, 1234);
        let s = StatCounter::from_display("1.2万");
        assert_eq!(s.raw, 0);
        assert_eq!(s.formatted, "1.2万");
    }

    #[test]
    fn descriptor_serializes_camel_case_without_empty_extras() {
        let mut d = MediaDescriptor::new(Platform::Douyin, "123");
        d.set_dimension(1920, 1080);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["platform"], "douyin");
        assert_eq!(json["dimension"], "1920x1080");
        assert!(json.get("bilibili").is_none());
        assert!(json.get("videoStreams").is_some());
    }
}
