//! Platform-specific auxiliary metadata carried as nested structures.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Hashtag {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MusicInfo {
    pub id: String,
    pub title: String,
    pub author: String,
    pub album: String,
    /// Milliseconds, as reported by the platform.
    pub duration: u64,
    pub cover: String,
    pub is_original: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MixInfo {
    pub id: String,
    pub name: String,
    pub desc: String,
    pub current_ep: u64,
    pub total_ep: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub name: String,
    pub content_type: String,
}

/// Sharing/remix permission flags; default to permissive when absent.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub allow_download: bool,
    pub allow_duet: bool,
    pub allow_stitch: bool,
    pub allow_share: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            allow_download: true,
            allow_duet: true,
            allow_stitch: true,
            allow_share: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DouyinExtras {
    pub hashtags: Vec<Hashtag>,
    pub author_signature: String,
    /// Author's total works, formatted.
    pub author_works: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music: Option<MusicInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mix: Option<MixInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<GameInfo>,
    #[serde(default)]
    pub permissions: Permissions,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub cid: u64,
    pub page: u32,
    pub part: String,
    pub duration: u64,
    pub width: u32,
    pub height: u32,
    pub first_frame: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleInfo {
    pub id: u64,
    pub lan: String,
    pub lan_doc: String,
    pub subtitle_url: String,
    #[serde(rename = "type")]
    pub kind: i32,
    pub ai_type: i32,
    pub ai_status: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SeasonInfo {
    pub id: u64,
    pub title: String,
    pub cover: String,
    pub mid: u64,
    pub intro: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct BilibiliExtras {
    pub aid: u64,
    pub cid: u64,
    pub tid: i64,
    pub tid_v2: i64,
    pub tname: String,
    pub tname_v2: String,
    pub copyright: i32,
    pub videos_count: u32,
    pub state: i32,
    pub dynamic: String,
    pub mission_id: u64,
    pub season_id: u64,
    pub rotate: i32,
    pub pages: Vec<PageInfo>,
    pub subtitles: Vec<SubtitleInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<SeasonInfo>,
    pub accept_quality: Vec<i64>,
    pub accept_description: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct XiaohongshuExtras {
    pub hashtags: Vec<Hashtag>,
    pub is_video: bool,
}
