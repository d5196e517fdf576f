use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};

use super::fingerprint::FingerprintCache;
use super::models::{ApiResponse, Dash, DashTrack, PlayData, ViewData};
use super::wbi::WbiSigner;
use crate::error::ExtractorError;
use crate::extractor::platform_extractor::{Extractor, PlatformExtractor};
use crate::extractor::utils::capture_group_1;
use crate::http::{DEFAULT_RETRIES, DEFAULT_RETRY_DELAY, send_with_retry};
use crate::media::{
    AudioStream, BilibiliExtras, MediaDescriptor, PageInfo, Platform, SeasonInfo, StatCounter,
    StreamVariant, SubtitleInfo, Timestamp, dedup_by_quality_id, format_size,
};

pub static BVID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(BV[a-zA-Z0-9]+)").unwrap());

const VIEW_API: &str = "https://api.bilibili.com/x/web-interface/view";
const PLAY_API: &str = "https://api.bilibili.com/x/player/wbi/playurl";

// WebGL fingerprint fields the playurl endpoint expects alongside the
// signed query.
const DEFAULT_DM_IMG_STR: &str = "V2ViR0wgMS";
const DEFAULT_DM_COVER_IMG_STR: &str = "QU5HTEUgKEludGVsLCBJbnRlbChSKSBVSEQgR3JhcGhpY3MgNjMwICgweDAwMDA5QkM4KSBEaXJlY3QzRDExIHZzXzVfMCBwc181XzAsIEQzRDExKUdvb2dsZSBJbmMuIChJbnRlb";

fn quality_label(quality_id: i64, height: u32) -> (String, String) {
    let (short, name) = match quality_id {
        127 => ("8K", "8K 超高清"),
        126 => ("杜比视界", "杜比视界"),
        125 => ("HDR", "HDR 真彩色"),
        120 => ("4K", "4K 超清"),
        116 => ("1080P60", "1080P 60帧"),
        112 => ("1080P+", "1080P 高码率"),
        80 => ("1080P", "1080P 高清"),
        74 => ("720P60", "720P 60帧"),
        64 => ("720P", "720P 高清"),
        32 => ("480P", "480P 清晰"),
        16 => ("360P", "360P 流畅"),
        _ => {
            let label = format!("{height}P");
            return (label.clone(), label);
        }
    };
    (short.to_string(), name.to_string())
}

// Asset URLs sometimes come back protocol-relative.
fn absolutize(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        url.to_string()
    }
}

pub struct Bilibili {
    pub extractor: Extractor,
    fingerprint: Arc<FingerprintCache>,
    user_cookie: Option<String>,
}

impl Bilibili {
    pub const BASE_URL: &'static str = "https://www.bilibili.com";

    pub fn new(
        url: String,
        client: Client,
        cookie: Option<String>,
        fingerprint: Arc<FingerprintCache>,
    ) -> Self {
        let mut extractor = Extractor::new("Bilibili", url, client);
        extractor.set_origin_and_referer_static(Self::BASE_URL);

        Self {
            extractor,
            fingerprint,
            user_cookie: cookie.filter(|c| !c.is_empty()),
        }
    }

    fn parse_bvid(url: &str) -> Option<String> {
        capture_group_1(&BVID_REGEX, url).map(ToOwned::to_owned)
    }

    /// Merge the cached device fingerprint with any caller cookie; a
    /// caller cookie containing SESSDATA unlocks the elevated quality
    /// parameters.
    async fn prepare_cookies(&mut self) -> bool {
        let device_cookie = self.fingerprint.get(&self.extractor.client).await;
        if !device_cookie.is_empty() {
            self.extractor.set_cookies_from_string(&device_cookie);
        }
        if let Some(user_cookie) = self.user_cookie.clone() {
            self.extractor.set_cookies_from_string(&user_cookie);
        }
        self.extractor.has_cookie("SESSDATA")
    }

    async fn fetch_view(&self, bvid: &str) -> Result<ViewData, ExtractorError> {
        let url = format!("{VIEW_API}?bvid={bvid}");
        let request = self.extractor.get(&url);
        let response = send_with_retry(request, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY).await?;

        let parsed: ApiResponse<ViewData> = response.json().await?;
        if parsed.code != 0 {
            // -404 means gone; -403 means region/auth restricted.
            if parsed.code == -403 {
                return Err(ExtractorError::UpstreamAuthRequired(parsed.message));
            }
            return Err(ExtractorError::UpstreamPayloadUnparseable(format!(
                "view api code {}: {}",
                parsed.code, parsed.message
            )));
        }
        parsed
            .data
            .ok_or_else(|| ExtractorError::UpstreamPayloadUnparseable("empty view data".into()))
    }

    async fn fetch_play_data(
        &self,
        aid: u64,
        cid: u64,
        is_login: bool,
    ) -> Result<PlayData, ExtractorError> {
        // Elevated parameters need a session cookie to be honored.
        let (qn, fnval) = if is_login { (127, 4048) } else { (64, 16) };
        debug!(aid, cid, qn, fnval, is_login, "requesting play addresses");

        let params: Vec<(&str, String)> = vec![
            ("avid", aid.to_string()),
            ("cid", cid.to_string()),
            ("qn", qn.to_string()),
            ("fnver", "0".to_string()),
            ("fnval", fnval.to_string()),
            ("fourk", "1".to_string()),
            ("dm_img_str", DEFAULT_DM_IMG_STR.to_string()),
            ("dm_cover_img_str", DEFAULT_DM_COVER_IMG_STR.to_string()),
            ("dm_img_list", "[]".to_string()),
        ];

        let cookie_header = if self.extractor.cookies.is_empty() {
            None
        } else {
            Some(
                self.extractor
                    .cookies
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        };
        let mut signer = WbiSigner::new(self.extractor.client.clone(), cookie_header);
        let signed = signer.sign(params).await;

        let url = format!("{PLAY_API}?{signed}");
        let request = self.extractor.get(&url);
        let response = send_with_retry(request, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY).await?;

        let parsed: ApiResponse<PlayData> = response.json().await?;
        if parsed.code != 0 {
            return Err(ExtractorError::UpstreamPayloadUnparseable(format!(
                "playurl api code {}: {}",
                parsed.code, parsed.message
            )));
        }
        parsed
            .data
            .ok_or_else(|| ExtractorError::UpstreamPayloadUnparseable("empty play data".into()))
    }

    fn build_video_streams(dash: &Dash, duration: u64) -> Vec<StreamVariant> {
        let mut streams = Vec::new();

        for track in &dash.video {
            if track.base_url.is_empty() {
                continue;
            }

            let (short, name) = quality_label(track.id, track.height);
            let estimated_size = if track.bandwidth > 0 && duration > 0 {
                track.bandwidth / 8 * duration
            } else {
                0
            };

            streams.push(StreamVariant {
                quality_id: track.id,
                display_name: name,
                short_label: short,
                url: track.base_url.clone(),
                backup_urls: track.backup_url.clone(),
                bitrate: track.bandwidth,
                width: track.width,
                height: track.height,
                codec: (!track.codecs.is_empty()).then(|| track.codecs.clone()),
                size: format_size(estimated_size),
                size_bytes: estimated_size,
                // qn ids are already ordered by quality.
                priority: track.id as i32,
            });
        }

        dedup_by_quality_id(streams)
    }

    /// Merge regular, Dolby and lossless audio tiers, keeping the track
    /// with the highest bandwidth.
    fn build_audio_stream(dash: &Dash, duration: u64) -> Option<AudioStream> {
        let mut candidates: Vec<&DashTrack> = dash.audio.iter().collect();
        if let Some(dolby) = &dash.dolby {
            candidates.extend(dolby.audio.iter());
        }
        if let Some(flac) = &dash.flac
            && let Some(track) = &flac.audio
        {
            candidates.push(track);
        }

        let best = candidates
            .into_iter()
            .filter(|t| !t.base_url.is_empty())
            .max_by_key(|t| (t.bandwidth, t.id))?;

        Some(AudioStream {
            url: best.base_url.clone(),
            backup_urls: best.backup_url.clone(),
            title: String::new(),
            author: String::new(),
            duration,
            bitrate: best.bandwidth,
            uri: String::new(),
            is_video_audio: false,
        })
    }

    fn build_extras(view: &ViewData, play: Option<&PlayData>) -> BilibiliExtras {
        let pages = view
            .pages
            .iter()
            .map(|p| PageInfo {
                cid: p.cid,
                page: p.page,
                part: p.part.clone(),
                duration: p.duration,
                width: p.dimension.width,
                height: p.dimension.height,
                first_frame: p.first_frame.clone(),
            })
            .collect();

        let subtitles = view
            .subtitle
            .as_ref()
            .map(|s| {
                s.list
                    .iter()
                    .map(|sub| SubtitleInfo {
                        id: sub.id,
                        lan: sub.lan.clone(),
                        lan_doc: sub.lan_doc.clone(),
                        subtitle_url: sub.subtitle_url.clone(),
                        kind: sub.kind,
                        ai_type: sub.ai_type,
                        ai_status: sub.ai_status,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let season = view.ugc_season.as_ref().map(|s| SeasonInfo {
            id: s.id,
            title: s.title.clone(),
            cover: s.cover.clone(),
            mid: s.mid,
            intro: s.intro.clone(),
        });

        BilibiliExtras {
            aid: view.aid,
            cid: view.cid,
            tid: view.tid,
            tid_v2: view.tid_v2,
            tname: view.tname.clone(),
            tname_v2: view.tname_v2.clone(),
            copyright: view.copyright,
            videos_count: view.videos,
            state: view.state,
            dynamic: view.dynamic.clone(),
            mission_id: view.mission_id,
            season_id: view.season_id,
            rotate: view.dimension.rotate,
            pages,
            subtitles,
            season,
            accept_quality: play.map(|p| p.accept_quality.clone()).unwrap_or_default(),
            accept_description: play
                .map(|p| p.accept_description.clone())
                .unwrap_or_default(),
        }
    }

    fn build_descriptor(&self, view: &ViewData, play: Option<&PlayData>) -> MediaDescriptor {
        let mut descriptor = MediaDescriptor::new(Platform::Bilibili, view.bvid.clone());
        descriptor.title = view.title.clone();
        descriptor.description = view.desc.clone();
        descriptor.cover_url = absolutize(&view.pic);
        descriptor.duration = view.duration;
        descriptor.created_at = Timestamp::from_epoch_secs(view.pubdate);
        descriptor.set_dimension(view.dimension.width, view.dimension.height);

        if let Some(owner) = view.owner.as_ref() {
            descriptor.author.name = owner.name.clone();
            descriptor.author.id = owner.mid.to_string();
            descriptor.author.avatar_url = absolutize(&owner.face);
        }

        if let Some(stat) = view.stat.as_ref() {
            descriptor.stats.insert("views".into(), StatCounter::of(stat.view));
            descriptor.stats.insert("likes".into(), StatCounter::of(stat.like));
            descriptor.stats.insert("comments".into(), StatCounter::of(stat.reply));
            descriptor.stats.insert("danmaku".into(), StatCounter::of(stat.danmaku));
            descriptor.stats.insert("coins".into(), StatCounter::of(stat.coin));
            descriptor
                .stats
                .insert("favorites".into(), StatCounter::of(stat.favorite));
            descriptor.stats.insert("shares".into(), StatCounter::of(stat.share));
        }

        if let Some(dash) = play.and_then(|p| p.dash.as_ref()) {
            descriptor.video_streams = Self::build_video_streams(dash, view.duration);
            descriptor.audio_stream = Self::build_audio_stream(dash, view.duration);
        }

        descriptor.bilibili = Some(Self::build_extras(view, play));
        descriptor.download_headers = self.extractor.download_headers();
        descriptor
    }
}

#[async_trait]
impl PlatformExtractor for Bilibili {
    fn get_extractor(&self) -> &Extractor {
        &self.extractor
    }

    async fn get_video_info(&mut self) -> Result<MediaDescriptor, ExtractorError> {
        let Some(bvid) = Self::parse_bvid(&self.extractor.url) else {
            return Err(ExtractorError::UnsupportedLinkFormat(
                self.extractor.url.clone(),
            ));
        };

        let is_login = self.prepare_cookies().await;
        let view = self.fetch_view(&bvid).await?;

        // A failed play request still yields a metadata-only descriptor;
        // the view payload alone is useful to callers.
        let play = match self.fetch_play_data(view.aid, view.cid, is_login).await {
            Ok(play) => Some(play),
            Err(e) => {
                warn!(bvid, error = %e, "play address fetch failed, returning metadata only");
                None
            }
        };

        Ok(self.build_descriptor(&view, play.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: i64, bandwidth: u64, height: u32) -> DashTrack {
        DashTrack {
            id,
            base_url: format!("https://cdn.example/{id}"),
            backup_url: vec![],
            bandwidth,
            width: height * 16 / 9,
            height,
            codecs: "avc1.640032".to_string(),
        }
    }

    fn dash_fixture() -> Dash {
        Dash {
            video: vec![track(80, 2_000_000, 1080), track(64, 1_000_000, 720), track(80, 1_800_000, 1080)],
            audio: vec![track(30280, 192_000, 0)],
            dolby: Some(super::super::models::DolbyAudio {
                audio: vec![track(30250, 640_000, 0)],
            }),
            flac: None,
        }
    }

    #[test]
    fn bvid_extraction() {
        assert_eq!(
            Bilibili::parse_bvid("https://www.bilibili.com/video/BV1xx411c7mD?p=2"),
            Some("BV1xx411c7mD".to_string())
        );
        assert_eq!(Bilibili::parse_bvid("https://b23.tv/abcdef"), None);
    }

    #[test]
    fn video_streams_dedup_by_quality_id() {
        let streams = Bilibili::build_video_streams(&dash_fixture(), 60);
        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].quality_id, 80);
        assert_eq!(streams[0].short_label, "1080P");
        assert_eq!(streams[0].display_name, "1080P 高清");
        assert_eq!(streams[1].quality_id, 64);
        // size = bandwidth/8 * duration
        assert_eq!(streams[0].size_bytes, 2_000_000 / 8 * 60);
    }

    #[test]
    fn audio_picks_highest_bandwidth_across_tiers() {
        let audio = Bilibili::build_audio_stream(&dash_fixture(), 60).unwrap();
        assert_eq!(audio.bitrate, 640_000);
        assert_eq!(audio.duration, 60);
        assert!(!audio.is_video_audio);
    }

    #[test]
    fn unknown_quality_id_falls_back_to_height() {
        let (short, name) = quality_label(999, 1440);
        assert_eq!(short, "1440P");
        assert_eq!(name, "1440P");
    }

    #[test]
    fn protocol_relative_urls_are_absolutized() {
        assert_eq!(
            absolutize("//i0.hdslb.com/bfs/archive/x.jpg"),
            "https://i0.hdslb.com/bfs/archive/x.jpg"
        );
        assert_eq!(absolutize("https://a/b"), "https://a/b");
    }
}
