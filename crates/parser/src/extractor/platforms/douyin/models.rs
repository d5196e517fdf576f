//! Tolerant models for the aweme detail payload. Every field the API has
//! been observed to omit at some point is optional or defaulted.

use serde::Deserialize;

#[derive(Deserialize, Debug, Default)]
pub(crate) struct DetailResponse {
    pub aweme_detail: Option<AwemeDetail>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct AwemeDetail {
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub create_time: i64,
    pub video: Option<VideoData>,
    pub author: Option<AuthorInfo>,
    pub statistics: Option<Statistics>,
    pub music: Option<Music>,
    #[serde(default)]
    pub text_extra: Vec<Option<TextExtra>>,
    #[serde(default)]
    pub images: Vec<Option<ImageInfo>>,
    pub status: Option<AwemeStatus>,
    pub game_tag_info: Option<GameTagInfo>,
    pub mix_info: Option<MixDetail>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct VideoData {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Milliseconds.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub bit_rate: Vec<Option<BitRateEntry>>,
    pub play_addr: Option<PlayAddr>,
    pub cover: Option<UrlList>,
    pub cover_original_scale: Option<UrlList>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct BitRateEntry {
    #[serde(default)]
    pub gear_name: String,
    #[serde(default)]
    pub quality_type: i64,
    #[serde(default)]
    pub bit_rate: u64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    pub play_addr: Option<PlayAddr>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct PlayAddr {
    #[serde(default)]
    pub url_list: Vec<String>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct UrlList {
    #[serde(default)]
    pub url_list: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct ImageInfo {
    #[serde(default)]
    pub url_list: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct AuthorInfo {
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub aweme_count: u64,
    pub avatar_thumb: Option<UrlList>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct Statistics {
    #[serde(default)]
    pub play_count: u64,
    #[serde(default)]
    pub digg_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub share_count: u64,
    #[serde(default)]
    pub collect_count: u64,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct Music {
    #[serde(default)]
    pub mid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub album: String,
    /// Seconds for music entries, unlike the video duration.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub is_original: bool,
    pub play_url: Option<PlayUrl>,
    pub cover_large: Option<UrlList>,
    pub cover_medium: Option<UrlList>,
    pub cover_thumb: Option<UrlList>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct PlayUrl {
    #[serde(default)]
    pub url_list: Vec<String>,
    #[serde(default)]
    pub uri: String,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct TextExtra {
    #[serde(default)]
    pub hashtag_id: Option<serde_json::Value>,
    #[serde(default)]
    pub hashtag_name: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct AwemeStatus {
    #[serde(default = "default_true")]
    pub allow_download: bool,
    #[serde(default = "default_true")]
    pub allow_duet: bool,
    #[serde(default = "default_true")]
    pub allow_stitch: bool,
    #[serde(default = "default_true")]
    pub allow_share: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct GameTagInfo {
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub content_type_name: String,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct MixDetail {
    #[serde(default)]
    pub mix_id: String,
    #[serde(default)]
    pub mix_name: String,
    #[serde(default)]
    pub desc: String,
    pub statis: Option<MixStatis>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct MixStatis {
    #[serde(default)]
    pub current_episode: u64,
    #[serde(default)]
    pub updated_to_episode: u64,
}

impl TextExtra {
    /// Hashtag ids arrive as either numbers or strings.
    pub fn hashtag_id_string(&self) -> String {
        match &self.hashtag_id {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }
}
