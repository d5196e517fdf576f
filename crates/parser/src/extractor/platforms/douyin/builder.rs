use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use super::bogus::{SignatureEngine, ms_token};
use super::models::{AwemeDetail, DetailResponse, Music, VideoData};
use super::quality;
use crate::error::ExtractorError;
use crate::extractor::default::DEFAULT_UA;
use crate::extractor::platform_extractor::{Extractor, PlatformExtractor};
use crate::extractor::utils::extract_trailing_path_segment;
use crate::http::{DEFAULT_RETRIES, DEFAULT_RETRY_DELAY, send_with_retry};
use crate::media::{
    AudioStream, DouyinExtras, GameInfo, Hashtag, MediaDescriptor, MixInfo, MusicInfo, Permissions,
    Platform, StatCounter, StreamVariant, Timestamp, dedup_by_bucket, format_size,
};

pub static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.|v\.)?(?:ies)?douyin\.com/").unwrap()
});
static AWEME_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(?:video|note|share/video)/(\d+)").unwrap());

const DETAIL_API: &str = "https://www.douyin.com/aweme/v1/web/aweme/detail/";
const WEBID: &str = "7307457174287205926";
const TTWID: &str = "1%7CvDWCB8tYdKPbdOlqwNTkDPhizBaV9i91KjYLKJbqurg%7C1723536402%7C314e63000decb79f46b8ff255560b29f4d8c57352dad465b41977db4830b4c7e";

// Browser environment echoed as query parameters; the detail API rejects
// requests whose fingerprint fields are missing or inconsistent.
const FIXED_PARAMS: &[(&str, &str)] = &[
    ("device_platform", "webapp"),
    ("aid", "6383"),
    ("channel", "channel_pc_web"),
    ("update_version_code", "170400"),
    ("pc_client_type", "1"),
    ("version_code", "190500"),
    ("version_name", "19.5.0"),
    ("cookie_enabled", "true"),
    ("screen_width", "1536"),
    ("screen_height", "864"),
    ("browser_language", "zh-CN"),
    ("browser_platform", "Win32"),
    ("browser_name", "Chrome"),
    ("browser_version", "127.0.0.0"),
    ("browser_online", "true"),
    ("engine_name", "Blink"),
    ("engine_version", "127.0.0.0"),
    ("os_name", "Windows"),
    ("os_version", "10"),
    ("cpu_core_num", "8"),
    ("device_memory", "8"),
    ("platform", "PC"),
    ("downlink", "1.25"),
    ("effective_type", "4g"),
    ("round_trip_time", "50"),
];

pub struct Douyin {
    pub extractor: Extractor,
    signature_engine: SignatureEngine,
    aweme_id: Option<String>,
    is_note: bool,
}

impl Douyin {
    /// Fails with `SignatureEngineUnavailable` if the signing sandbox
    /// cannot be constructed; the caller cannot proceed without it.
    pub fn new(url: String, client: Client, cookie: Option<String>) -> Result<Self, ExtractorError> {
        let signature_engine = SignatureEngine::new()?;

        let is_note = url.contains("/note/");
        let aweme_id = Self::parse_aweme_id(&url);

        let mut extractor = Extractor::new("Douyin", url, client);
        extractor.add_header_str("Accept", "application/json, text/plain, */*");
        extractor.add_header_str(
            "sec-ch-ua",
            "\"Google Chrome\";v=\"123\", \"Not:A-Brand\";v=\"8\", \"Chromium\";v=\"123\"",
        );
        extractor.add_header_str("sec-ch-ua-mobile", "?0");
        extractor.add_header_str("sec-ch-ua-platform", "\"Windows\"");
        extractor.add_header_str("Sec-Fetch-Site", "same-origin");
        extractor.add_header_str("Sec-Fetch-Mode", "cors");
        extractor.add_header_str("Sec-Fetch-Dest", "empty");
        extractor.add_cookie("ttwid", TTWID);
        if let Some(cookie) = cookie {
            extractor.set_cookies_from_string(&cookie);
        }

        Ok(Self {
            extractor,
            signature_engine,
            aweme_id,
            is_note,
        })
    }

    fn parse_aweme_id(url: &str) -> Option<String> {
        AWEME_ID_REGEX
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .or_else(|| {
                extract_trailing_path_segment(url)
                    .filter(|segment| segment.chars().all(|c| c.is_ascii_digit()))
            })
    }

    fn build_detail_url(&self, aweme_id: &str) -> Result<String, ExtractorError> {
        let mut url = Url::parse(DETAIL_API)
            .map_err(|e| ExtractorError::InvalidUrl(e.to_string()))?;

        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in FIXED_PARAMS {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("aweme_id", aweme_id);
            pairs.append_pair("webid", WEBID);
            pairs.append_pair("msToken", &ms_token());
        }

        let query = url.query().unwrap_or_default().to_string();
        let a_bogus = self.signature_engine.sign(&query, DEFAULT_UA)?;
        url.query_pairs_mut().append_pair("a_bogus", &a_bogus);

        Ok(url.to_string())
    }

    async fn fetch_detail(&mut self, aweme_id: &str) -> Result<AwemeDetail, ExtractorError> {
        let referer = format!("https://www.douyin.com/video/{aweme_id}?previous_page=web_code_link");
        self.extractor.add_header_str("Referer", &referer);

        let detail_url = self.build_detail_url(aweme_id)?;
        debug!(aweme_id, "fetching aweme detail");

        let request = self.extractor.get(&detail_url);
        let response = send_with_retry(request, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY).await?;

        let body = response.text().await?;
        if body.is_empty() {
            return Err(ExtractorError::UpstreamPayloadUnparseable(
                "empty detail response".to_string(),
            ));
        }

        let parsed: DetailResponse = serde_json::from_str(&body)?;
        parsed.aweme_detail.ok_or_else(|| {
            ExtractorError::UpstreamPayloadUnparseable("missing aweme_detail".to_string())
        })
    }

    fn pick_url(url_list: &[String]) -> Option<&String> {
        // The third entry is the unwatermarked CDN host when present.
        url_list.get(2).or_else(|| url_list.first())
    }

    fn build_video_streams(video: &VideoData) -> Vec<StreamVariant> {
        let mut streams = Vec::new();

        for entry in video.bit_rate.iter().flatten() {
            let Some(play_addr) = entry.play_addr.as_ref() else {
                continue;
            };
            let Some(url) = Self::pick_url(&play_addr.url_list) else {
                continue;
            };

            let width = if play_addr.width > 0 { play_addr.width } else { entry.width };
            let height = if play_addr.height > 0 { play_addr.height } else { entry.height };
            let (name, short, priority) = quality::resolve(&entry.gear_name, width, height);

            let estimated_size = if entry.bit_rate > 0 && video.duration > 0 {
                (entry.bit_rate / 8) * video.duration / 1000
            } else {
                0
            };

            streams.push(StreamVariant {
                quality_id: entry.quality_type,
                display_name: name,
                short_label: short,
                url: url.clone(),
                backup_urls: play_addr.url_list.clone(),
                bitrate: entry.bit_rate,
                width,
                height,
                codec: None,
                size: format_size(estimated_size),
                size_bytes: estimated_size,
                priority,
            });
        }

        if streams.is_empty()
            && let Some(play_addr) = video.play_addr.as_ref()
            && let Some(url) = Self::pick_url(&play_addr.url_list)
        {
            streams.push(StreamVariant {
                quality_id: 0,
                display_name: "默认画质".to_string(),
                short_label: "SD".to_string(),
                url: url.clone(),
                backup_urls: play_addr.url_list.clone(),
                bitrate: 0,
                width: video.width,
                height: video.height,
                codec: None,
                size: "未知".to_string(),
                size_bytes: 0,
                priority: 0,
            });
        }

        dedup_by_bucket(streams)
    }

    fn build_audio_stream(video: &VideoData, music: Option<&Music>) -> Option<AudioStream> {
        if let Some(music) = music
            && let Some(play_url) = music.play_url.as_ref()
            && let Some(url) = play_url.url_list.first()
        {
            return Some(AudioStream {
                url: url.clone(),
                backup_urls: play_url.url_list.clone(),
                title: music.title.clone(),
                author: music.author.clone(),
                duration: music.duration,
                bitrate: 0,
                uri: play_url.uri.clone(),
                is_video_audio: false,
            });
        }

        // No independent music track, fall back to the video's own audio.
        let video_audio = |url_list: &[String], url: &String| AudioStream {
            url: url.clone(),
            backup_urls: url_list.to_vec(),
            title: music.map(|m| m.title.clone()).unwrap_or_default(),
            author: music.map(|m| m.author.clone()).unwrap_or_default(),
            duration: video.duration / 1000,
            bitrate: 0,
            uri: String::new(),
            is_video_audio: true,
        };

        if let Some(entry) = video.bit_rate.iter().flatten().next()
            && let Some(play_addr) = entry.play_addr.as_ref()
            && let Some(url) = Self::pick_url(&play_addr.url_list)
        {
            return Some(video_audio(&play_addr.url_list, url));
        }

        if let Some(play_addr) = video.play_addr.as_ref()
            && let Some(url) = play_addr.url_list.first()
        {
            return Some(video_audio(&play_addr.url_list, url));
        }

        None
    }

    fn pick_cover(video: &VideoData, images: &[String]) -> String {
        video
            .cover_original_scale
            .as_ref()
            .and_then(|c| c.url_list.first())
            .or_else(|| video.cover.as_ref().and_then(|c| c.url_list.first()))
            .cloned()
            .or_else(|| images.first().cloned())
            .unwrap_or_default()
    }

    fn build_extras(detail: &AwemeDetail) -> DouyinExtras {
        let hashtags = detail
            .text_extra
            .iter()
            .flatten()
            .filter(|t| !t.hashtag_name.is_empty())
            .map(|t| Hashtag {
                id: t.hashtag_id_string(),
                name: t.hashtag_name.clone(),
            })
            .collect();

        let music = detail.music.as_ref().map(|m| {
            let cover = m
                .cover_large
                .as_ref()
                .or(m.cover_medium.as_ref())
                .or(m.cover_thumb.as_ref())
                .and_then(|c| c.url_list.first())
                .cloned()
                .unwrap_or_default();
            MusicInfo {
                id: m.mid.clone(),
                title: m.title.clone(),
                author: m.author.clone(),
                album: m.album.clone(),
                duration: m.duration,
                cover,
                is_original: m.is_original,
            }
        });

        let mix = detail.mix_info.as_ref().map(|m| MixInfo {
            id: m.mix_id.clone(),
            name: m.mix_name.clone(),
            desc: m.desc.clone(),
            current_ep: m.statis.as_ref().map(|s| s.current_episode).unwrap_or(0),
            total_ep: m.statis.as_ref().map(|s| s.updated_to_episode).unwrap_or(0),
        });

        let game = detail.game_tag_info.as_ref().map(|g| GameInfo {
            name: g.game_name.clone(),
            content_type: g.content_type_name.clone(),
        });

        let permissions = detail
            .status
            .as_ref()
            .map(|s| Permissions {
                allow_download: s.allow_download,
                allow_duet: s.allow_duet,
                allow_stitch: s.allow_stitch,
                allow_share: s.allow_share,
            })
            .unwrap_or_default();

        let author = detail.author.as_ref();
        DouyinExtras {
            hashtags,
            author_signature: author.map(|a| a.signature.clone()).unwrap_or_default(),
            author_works: StatCounter::of(author.map(|a| a.aweme_count).unwrap_or(0)).formatted,
            music,
            mix,
            game,
            permissions,
        }
    }

    fn build_descriptor(&self, aweme_id: &str, detail: &AwemeDetail) -> MediaDescriptor {
        let mut descriptor = MediaDescriptor::new(Platform::Douyin, aweme_id);
        descriptor.title = detail.desc.clone();
        descriptor.created_at = Timestamp::from_epoch_secs(detail.create_time);

        if let Some(author) = detail.author.as_ref() {
            descriptor.author.name = author.nickname.clone();
            descriptor.author.id = author.uid.clone();
            descriptor.author.avatar_url = author
                .avatar_thumb
                .as_ref()
                .and_then(|a| a.url_list.first())
                .cloned()
                .unwrap_or_default();
        }

        if let Some(stats) = detail.statistics.as_ref() {
            descriptor.stats.insert("views".into(), StatCounter::of(stats.play_count));
            descriptor.stats.insert("likes".into(), StatCounter::of(stats.digg_count));
            descriptor
                .stats
                .insert("comments".into(), StatCounter::of(stats.comment_count));
            descriptor.stats.insert("shares".into(), StatCounter::of(stats.share_count));
            descriptor
                .stats
                .insert("collects".into(), StatCounter::of(stats.collect_count));
        }

        descriptor.images = detail
            .images
            .iter()
            .flatten()
            .filter_map(|img| img.url_list.first().cloned())
            .collect();

        if let Some(video) = detail.video.as_ref() {
            descriptor.video_streams = Self::build_video_streams(video);
            descriptor.audio_stream = Self::build_audio_stream(video, detail.music.as_ref());
            descriptor.cover_url = Self::pick_cover(video, &descriptor.images);
            descriptor.duration = video.duration / 1000;
            descriptor.set_dimension(video.width, video.height);
        }

        descriptor.is_note = self.is_note || !descriptor.images.is_empty();
        descriptor.douyin = Some(Self::build_extras(detail));
        descriptor.download_headers = self.extractor.download_headers();
        descriptor
    }
}

#[async_trait]
impl PlatformExtractor for Douyin {
    fn get_extractor(&self) -> &Extractor {
        &self.extractor
    }

    async fn get_video_info(&mut self) -> Result<MediaDescriptor, ExtractorError> {
        let Some(aweme_id) = self.aweme_id.clone() else {
            return Err(ExtractorError::UnsupportedLinkFormat(
                self.extractor.url.clone(),
            ));
        };

        let detail = self.fetch_detail(&aweme_id).await?;
        let descriptor = self.build_descriptor(&aweme_id, &detail);

        if !descriptor.has_media() {
            warn!(aweme_id, "aweme detail contained no playable stream or images");
            return Err(ExtractorError::NoMediaFound);
        }

        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_fixture() -> AwemeDetail {
        serde_json::from_value(serde_json::json!({
            "desc": "测试视频",
            "create_time": 1723536402,
            "video": {
                "width": 1080,
                "height": 1920,
                "duration": 15000,
                "bit_rate": [
                    {
                        "gear_name": "adapt_1080_1",
                        "quality_type": 1,
                        "bit_rate": 2_000_000,
                        "play_addr": {
                            "url_list": ["https://a/1", "https://b/1", "https://c/1"],
                            "width": 1080,
                            "height": 1920
                        }
                    },
                    {
                        "gear_name": "adapt_720_1",
                        "quality_type": 11,
                        "bit_rate": 1_000_000,
                        "play_addr": {
                            "url_list": ["https://a/2"],
                            "width": 720,
                            "height": 1280
                        }
                    }
                ],
                "cover": { "url_list": ["https://cover/1"] }
            },
            "author": { "nickname": "作者", "uid": "42", "aweme_count": 12345 },
            "statistics": { "play_count": 123456, "digg_count": 789 },
            "status": { "allow_download": false }
        }))
        .unwrap()
    }

    #[test]
    fn aweme_id_from_canonical_and_short_paths() {
        assert_eq!(
            Douyin::parse_aweme_id("https://www.douyin.com/video/7343529937259220274"),
            Some("7343529937259220274".to_string())
        );
        assert_eq!(
            Douyin::parse_aweme_id("https://www.douyin.com/note/7343529937259220274?x=1"),
            Some("7343529937259220274".to_string())
        );
        // Short-link slugs are not numeric ids.
        assert_eq!(Douyin::parse_aweme_id("https://v.douyin.com/iRNBho6u/"), None);
    }

    #[test]
    fn streams_built_from_bitrate_ladder() {
        let detail = detail_fixture();
        let streams = Douyin::build_video_streams(detail.video.as_ref().unwrap());

        assert_eq!(streams.len(), 2);
        // Unwatermarked third URL preferred when present.
        assert_eq!(streams[0].url, "https://c/1");
        assert_eq!(streams[0].short_label, "1080P");
        assert_eq!(streams[1].url, "https://a/2");
        // size = bit_rate/8 * duration_secs
        assert_eq!(streams[0].size_bytes, 2_000_000 / 8 * 15);
    }

    #[test]
    fn video_audio_fallback_when_no_music_track() {
        let detail = detail_fixture();
        let audio = Douyin::build_audio_stream(detail.video.as_ref().unwrap(), None).unwrap();
        assert!(audio.is_video_audio);
        assert_eq!(audio.duration, 15);
        assert_eq!(audio.url, "https://c/1");
    }

    #[test]
    fn descriptor_mapping() {
        let detail = detail_fixture();
        let extras = Douyin::build_extras(&detail);
        assert!(!extras.permissions.allow_download);
        assert!(extras.permissions.allow_duet);
        assert_eq!(extras.author_works, "1.2万");
    }
}
