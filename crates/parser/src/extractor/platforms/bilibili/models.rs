//! View and playurl API models. Field aliases cover both snake_case and
//! camelCase variants the playurl endpoint has shipped over time.

use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub(crate) struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct ViewData {
    #[serde(default)]
    pub bvid: String,
    #[serde(default)]
    pub aid: u64,
    #[serde(default)]
    pub cid: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub pic: String,
    /// Seconds.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub pubdate: i64,
    #[serde(default)]
    pub tid: i64,
    #[serde(default)]
    pub tid_v2: i64,
    #[serde(default)]
    pub tname: String,
    #[serde(default)]
    pub tname_v2: String,
    #[serde(default)]
    pub copyright: i32,
    #[serde(default)]
    pub videos: u32,
    #[serde(default)]
    pub state: i32,
    #[serde(default)]
    pub dynamic: String,
    #[serde(default)]
    pub mission_id: u64,
    #[serde(default)]
    pub season_id: u64,
    #[serde(default)]
    pub dimension: Dimension,
    pub owner: Option<Owner>,
    pub stat: Option<Stat>,
    #[serde(default)]
    pub pages: Vec<Page>,
    pub subtitle: Option<SubtitleData>,
    pub ugc_season: Option<UgcSeason>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct Dimension {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub rotate: i32,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct Owner {
    #[serde(default)]
    pub mid: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub face: String,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct Stat {
    #[serde(default)]
    pub view: u64,
    #[serde(default)]
    pub like: u64,
    #[serde(default)]
    pub reply: u64,
    #[serde(default)]
    pub danmaku: u64,
    #[serde(default)]
    pub coin: u64,
    #[serde(default)]
    pub favorite: u64,
    #[serde(default)]
    pub share: u64,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct Page {
    #[serde(default)]
    pub cid: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub part: String,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub dimension: Dimension,
    #[serde(default)]
    pub first_frame: String,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct SubtitleData {
    #[serde(default)]
    pub list: Vec<Subtitle>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct Subtitle {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub lan: String,
    #[serde(default)]
    pub lan_doc: String,
    #[serde(default)]
    pub subtitle_url: String,
    #[serde(rename = "type", default)]
    pub kind: i32,
    #[serde(default)]
    pub ai_type: i32,
    #[serde(default)]
    pub ai_status: i32,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct UgcSeason {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub mid: u64,
    #[serde(default)]
    pub intro: String,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct PlayData {
    pub dash: Option<Dash>,
    #[serde(default)]
    pub accept_quality: Vec<i64>,
    #[serde(default)]
    pub accept_description: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct Dash {
    #[serde(default)]
    pub video: Vec<DashTrack>,
    #[serde(default)]
    pub audio: Vec<DashTrack>,
    pub dolby: Option<DolbyAudio>,
    pub flac: Option<FlacAudio>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct DolbyAudio {
    #[serde(default)]
    pub audio: Vec<DashTrack>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct FlacAudio {
    pub audio: Option<DashTrack>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub(crate) struct DashTrack {
    #[serde(default)]
    pub id: i64,
    #[serde(default, alias = "baseUrl")]
    pub base_url: String,
    #[serde(default, alias = "backupUrl")]
    pub backup_url: Vec<String>,
    #[serde(default)]
    pub bandwidth: u64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub codecs: String,
}
