use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::models::{LadderStream, NoteDetail};
use crate::error::ExtractorError;
use crate::extractor::platform_extractor::{Extractor, PlatformExtractor};
use crate::extractor::utils::extract_trailing_path_segment;
use crate::http::{DEFAULT_RETRIES, DEFAULT_RETRY_DELAY, send_with_retry};
use crate::media::{
    AudioStream, Hashtag, MediaDescriptor, Platform, StatCounter, StreamVariant, Timestamp,
    XiaohongshuExtras, format_size,
};

// Primary: the state blob sits in its own script tag. Fallback: raw
// match over the whole page for builds that inline it differently.
static SCRIPT_STATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<script>\s*window\.__INITIAL_STATE__\s*=\s*(\{.*?\})\s*;?\s*</script>")
        .unwrap()
});
static RAW_STATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)window\.__INITIAL_STATE__\s*=\s*(\{.*\})").unwrap());

const ORIGIN_VIDEO_CDN: &str = "http://sns-video-bd.xhscdn.com";

fn quality_display_name(quality_type: &str) -> String {
    match quality_type {
        "SD" => "标清".to_string(),
        "HD" => "高清".to_string(),
        "FHD" => "超清".to_string(),
        "UHD" => "4K".to_string(),
        other => other.to_string(),
    }
}

// The blob escapes slashes as / inside asset URLs.
fn fix_url(url: &str) -> String {
    url.replace("\\u002F", "/")
}

/// Locate and parse the embedded initial-state JSON. The blob is not
/// standard JSON: it may end in a semicolon and contains literal
/// `undefined` tokens.
pub(crate) fn parse_initial_state(body: &str) -> Result<Value, ExtractorError> {
    let captured = SCRIPT_STATE_REGEX
        .captures(body)
        .or_else(|| RAW_STATE_REGEX.captures(body))
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| {
            ExtractorError::UpstreamPayloadUnparseable(
                "__INITIAL_STATE__ blob not found in page".to_string(),
            )
        })?;

    let json_data = captured
        .as_str()
        .trim_end_matches(';')
        .replace("undefined", "null");

    Ok(serde_json::from_str(&json_data)?)
}

/// Find the note's detail record. `firstNoteId` is the primary pointer;
/// the first key of `noteDetailMap` is a logged degraded path. Neither
/// present means the platform is withholding data until a login cookie
/// is supplied.
pub(crate) fn locate_note(state: &Value) -> Result<(String, NoteDetail), ExtractorError> {
    let note = state.get("note");

    let note_id = note
        .and_then(|n| n.get("firstNoteId"))
        .and_then(|v| v.as_str())
        .map(ToOwned::to_owned)
        .or_else(|| {
            let first_key = note
                .and_then(|n| n.get("noteDetailMap"))
                .and_then(|m| m.as_object())
                .and_then(|m| m.keys().next())
                .cloned();
            if let Some(key) = &first_key {
                warn!(note_id = %key, "firstNoteId missing, using first noteDetailMap key");
            }
            first_key
        })
        .ok_or_else(|| {
            ExtractorError::UpstreamAuthRequired(
                "note data withheld, a login cookie is required".to_string(),
            )
        })?;

    let detail_value = note
        .and_then(|n| n.get("noteDetailMap"))
        .and_then(|m| m.get(&note_id))
        .and_then(|entry| entry.get("note"))
        .cloned()
        .ok_or_else(|| {
            ExtractorError::UpstreamPayloadUnparseable(format!(
                "noteDetailMap has no record for {note_id}"
            ))
        })?;

    let detail: NoteDetail = serde_json::from_value(detail_value)?;
    Ok((note_id, detail))
}

fn ladder_variant(idx: usize, stream: &LadderStream) -> StreamVariant {
    StreamVariant {
        quality_id: idx as i64,
        display_name: quality_display_name(&stream.quality_type),
        short_label: if stream.quality_type.is_empty() {
            "HD".to_string()
        } else {
            stream.quality_type.clone()
        },
        url: fix_url(&stream.master_url),
        backup_urls: stream.backup_urls.iter().map(|u| fix_url(u)).collect(),
        bitrate: stream.avg_bitrate,
        width: stream.width,
        height: stream.height,
        codec: Some("h264".to_string()),
        size: format_size(stream.size),
        size_bytes: stream.size,
        priority: 2,
    }
}

pub struct Xiaohongshu {
    pub extractor: Extractor,
}

impl Xiaohongshu {
    pub fn new(url: String, client: Client, cookie: Option<String>) -> Self {
        let mut extractor = Extractor::new("Xiaohongshu", url, client);
        extractor.set_referer_static("https://www.xiaohongshu.com/");
        extractor.add_header_str("Cache-Control", "no-cache");
        extractor.add_header_str("Pragma", "no-cache");
        extractor.add_header_str(
            "Sec-Ch-Ua",
            "\"Chromium\";v=\"128\", \"Not;A=Brand\";v=\"24\", \"Google Chrome\";v=\"128\"",
        );
        extractor.add_header_str("Sec-Ch-Ua-Mobile", "?0");
        extractor.add_header_str("Sec-Ch-Ua-Platform", "\"Windows\"");
        extractor.add_header_str("Sec-Fetch-Dest", "document");
        extractor.add_header_str("Sec-Fetch-Mode", "navigate");
        extractor.add_header_str("Sec-Fetch-Site", "none");
        extractor.add_header_str("Sec-Fetch-User", "?1");
        extractor.add_header_str("Upgrade-Insecure-Requests", "1");

        if let Some(cookie) = cookie.filter(|c| !c.is_empty()) {
            extractor.set_cookies_from_string(&cookie);
        }

        Self { extractor }
    }

    fn build_video_streams(detail: &NoteDetail) -> (Vec<StreamVariant>, u64) {
        let Some(video) = detail.video.as_ref() else {
            return (Vec::new(), 0);
        };

        let ladder = video
            .media
            .as_ref()
            .and_then(|m| m.stream.as_ref())
            .map(|s| s.h264.as_slice())
            .unwrap_or_default();

        let mut streams: Vec<StreamVariant> = ladder
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.master_url.is_empty())
            .map(|(idx, s)| ladder_variant(idx, s))
            .collect();
        let mut duration = ladder
            .iter()
            .find(|s| !s.master_url.is_empty())
            .map(|s| s.duration / 1000)
            .unwrap_or(0);

        // No usable ladder, derive a single URL from the origin key.
        if streams.is_empty()
            && let Some(consumer) = video.consumer.as_ref()
            && !consumer.origin_video_key.is_empty()
        {
            let key = fix_url(&consumer.origin_video_key);
            let url = format!("{ORIGIN_VIDEO_CDN}/{key}");
            duration = video.capa.as_ref().map(|c| c.duration).unwrap_or(0);
            streams.push(StreamVariant {
                quality_id: 0,
                display_name: "高清".to_string(),
                short_label: "HD".to_string(),
                url: url.clone(),
                backup_urls: vec![url],
                bitrate: 0,
                width: video.width,
                height: video.height,
                codec: None,
                size: "未知".to_string(),
                size_bytes: 0,
                priority: 2,
            });
        }

        (streams, duration)
    }

    pub(crate) fn build_descriptor(&self, state: &Value) -> Result<MediaDescriptor, ExtractorError> {
        let (note_id, detail) = locate_note(state)?;
        let is_video = detail.is_video();

        let mut descriptor = MediaDescriptor::new(Platform::Xiaohongshu, note_id);
        descriptor.description = detail.desc.clone();
        descriptor.title = if !detail.title.is_empty() {
            detail.title.clone()
        } else if !detail.desc.is_empty() {
            detail.desc.chars().take(50).collect()
        } else {
            "无标题".to_string()
        };

        if let Some(user) = detail.user.as_ref() {
            descriptor.author.name = user.nickname.clone();
            descriptor.author.id = user.user_id.clone();
            descriptor.author.avatar_url = user.avatar.clone();
        }

        if let Some(interact) = detail.interact_info.as_ref() {
            descriptor
                .stats
                .insert("likes".into(), StatCounter::from_display(&interact.liked_count));
            descriptor.stats.insert(
                "comments".into(),
                StatCounter::from_display(&interact.comment_count),
            );
            descriptor.stats.insert(
                "collects".into(),
                StatCounter::from_display(&interact.collected_count),
            );
            descriptor
                .stats
                .insert("shares".into(), StatCounter::from_display(&interact.share_count));
        }

        descriptor.images = detail
            .image_list
            .iter()
            .filter(|img| !img.url_default.is_empty())
            .map(|img| fix_url(&img.url_default))
            .collect();
        descriptor.cover_url = descriptor.images.first().cloned().unwrap_or_default();

        if is_video {
            let (streams, duration) = Self::build_video_streams(&detail);
            if let Some(primary) = streams.first() {
                descriptor.audio_stream = Some(AudioStream {
                    url: primary.url.clone(),
                    backup_urls: if primary.backup_urls.is_empty() {
                        vec![primary.url.clone()]
                    } else {
                        primary.backup_urls.clone()
                    },
                    title: String::new(),
                    author: String::new(),
                    duration,
                    bitrate: 0,
                    uri: String::new(),
                    is_video_audio: true,
                });
                descriptor.set_dimension(primary.width, primary.height);
            }
            descriptor.video_streams = streams;
            descriptor.duration = duration;
        }

        // Milliseconds in the blob.
        descriptor.created_at = Timestamp::from_epoch_secs(detail.time / 1000);
        descriptor.is_note = !is_video;
        descriptor.xiaohongshu = Some(XiaohongshuExtras {
            hashtags: detail
                .tag_list
                .iter()
                .filter(|t| !t.name.is_empty())
                .map(|t| Hashtag {
                    id: t.id_string(),
                    name: t.name.clone(),
                })
                .collect(),
            is_video,
        });
        descriptor.download_headers = self.extractor.download_headers();
        Ok(descriptor)
    }
}

#[async_trait]
impl PlatformExtractor for Xiaohongshu {
    fn get_extractor(&self) -> &Extractor {
        &self.extractor
    }

    async fn get_video_info(&mut self) -> Result<MediaDescriptor, ExtractorError> {
        let note_id = extract_trailing_path_segment(&self.extractor.url);
        debug!(url = %self.extractor.url, ?note_id, "fetching note page");

        let request = self.extractor.get(&self.extractor.url);
        let response = send_with_retry(request, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY).await?;
        let body = response.text().await?;

        let state = parse_initial_state(&body)?;
        let descriptor = self.build_descriptor(&state)?;

        if !descriptor.has_media() {
            return Err(ExtractorError::NoMediaFound);
        }
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::default::default_client;

    fn page_with_state(state: &str) -> String {
        format!(
            "<html><head></head><body><script>window.__INITIAL_STATE__={state};</script></body></html>"
        )
    }

    fn extractor() -> Xiaohongshu {
        Xiaohongshu::new(
            "https://www.xiaohongshu.com/explore/abc".to_string(),
            default_client(),
            None,
        )
    }

    #[test]
    fn state_blob_with_undefined_tokens_parses() {
        let body = page_with_state(r#"{"note":{"firstNoteId":undefined,"noteDetailMap":{}}}"#);
        let state = parse_initial_state(&body).unwrap();
        assert!(state["note"]["firstNoteId"].is_null());
    }

    #[test]
    fn raw_fallback_when_state_not_in_own_script_tag() {
        let body = r#"<script>var x=1;window.__INITIAL_STATE__={"note":{"firstNoteId":"n1","noteDetailMap":{"n1":{"note":{"title":"t"}}}}};other()</script>"#;
        let state = parse_initial_state(body).unwrap();
        let (id, detail) = locate_note(&state).unwrap();
        assert_eq!(id, "n1");
        assert_eq!(detail.title, "t");
    }

    #[test]
    fn missing_pointer_falls_back_to_first_map_key() {
        let state: Value = serde_json::from_str(
            r#"{"note":{"noteDetailMap":{"n9":{"note":{"title":"fallback"}}}}}"#,
        )
        .unwrap();
        let (id, detail) = locate_note(&state).unwrap();
        assert_eq!(id, "n9");
        assert_eq!(detail.title, "fallback");
    }

    #[test]
    fn empty_state_means_auth_required() {
        let state: Value = serde_json::from_str(r#"{"note":{"noteDetailMap":{}}}"#).unwrap();
        let err = locate_note(&state).unwrap_err();
        assert!(matches!(err, ExtractorError::UpstreamAuthRequired(_)));
    }

    #[test]
    fn video_note_end_to_end_fixture() {
        let body = page_with_state(
            r#"{"note":{"firstNoteId":"abc","noteDetailMap":{"abc":{"note":{"title":"T","type":"video","video":{"media":{"stream":{"h264":[{"masterUrl":"https:\\u002F\\u002Fsns-video.xhscdn.com\\u002Fv1","backupUrls":[],"duration":12000,"size":2097152,"qualityType":"HD","avgBitrate":1200000,"width":1080,"height":1920}]}}}}}}}}"#,
        );
        let state = parse_initial_state(&body).unwrap();
        let descriptor = extractor().build_descriptor(&state).unwrap();

        assert_eq!(descriptor.title, "T");
        assert!(!descriptor.video_streams.is_empty());
        assert_eq!(
            descriptor.video_streams[0].url,
            "https://sns-video.xhscdn.com/v1"
        );
        assert_eq!(descriptor.video_streams[0].display_name, "高清");
        assert_eq!(descriptor.duration, 12);
        assert!(!descriptor.is_note);
        assert!(descriptor.audio_stream.as_ref().unwrap().is_video_audio);
    }

    #[test]
    fn origin_key_fallback_builds_single_stream() {
        let state: Value = serde_json::from_str(
            r#"{"note":{"firstNoteId":"k1","noteDetailMap":{"k1":{"note":{"title":"T","type":"video","video":{"consumer":{"originVideoKey":"pre\\u002Fpost\\u002F1"},"capa":{"duration":33},"width":720,"height":1280}}}}}}"#,
        )
        .unwrap();
        let descriptor = extractor().build_descriptor(&state).unwrap();

        assert_eq!(descriptor.video_streams.len(), 1);
        assert_eq!(
            descriptor.video_streams[0].url,
            "http://sns-video-bd.xhscdn.com/pre/post/1"
        );
        assert_eq!(descriptor.duration, 33);
    }

    #[test]
    fn image_note_collects_images() {
        let state: Value = serde_json::from_str(
            r#"{"note":{"firstNoteId":"i1","noteDetailMap":{"i1":{"note":{"title":"","desc":"很长的描述","type":"normal","imageList":[{"urlDefault":"https:\\u002F\\u002Fimg\\u002F1.jpg"},{"urlDefault":""}],"interactInfo":{"likedCount":"1.2万"}}}}}}"#,
        )
        .unwrap();
        let descriptor = extractor().build_descriptor(&state).unwrap();

        assert!(descriptor.is_note);
        assert_eq!(descriptor.images, vec!["https://img/1.jpg"]);
        assert_eq!(descriptor.title, "很长的描述");
        assert_eq!(descriptor.stats["likes"].formatted, "1.2万");
        assert!(descriptor.has_media());
    }
}
