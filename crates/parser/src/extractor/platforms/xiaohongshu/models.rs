//! Models for the note detail record embedded in the page's initial
//! state blob. Counters arrive pre-formatted as strings (`1.2万`).

use serde::Deserialize;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NoteDetail {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub user: Option<NoteUser>,
    pub interact_info: Option<InteractInfo>,
    #[serde(default)]
    pub image_list: Vec<ImageItem>,
    pub video: Option<VideoNode>,
    #[serde(default)]
    pub tag_list: Vec<TagItem>,
    /// Milliseconds.
    #[serde(default)]
    pub time: i64,
}

impl NoteDetail {
    pub fn is_video(&self) -> bool {
        self.kind == "video"
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NoteUser {
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub avatar: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InteractInfo {
    #[serde(default)]
    pub liked_count: String,
    #[serde(default)]
    pub comment_count: String,
    #[serde(default)]
    pub collected_count: String,
    #[serde(default)]
    pub share_count: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageItem {
    #[serde(default)]
    pub url_default: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TagItem {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub name: String,
}

impl TagItem {
    pub fn id_string(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoNode {
    pub media: Option<MediaNode>,
    pub consumer: Option<ConsumerNode>,
    pub capa: Option<CapaNode>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MediaNode {
    pub stream: Option<StreamSet>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StreamSet {
    #[serde(default)]
    pub h264: Vec<LadderStream>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LadderStream {
    #[serde(default)]
    pub master_url: String,
    #[serde(default)]
    pub backup_urls: Vec<String>,
    /// Milliseconds.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub quality_type: String,
    #[serde(default)]
    pub avg_bitrate: u64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConsumerNode {
    #[serde(default)]
    pub origin_video_key: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CapaNode {
    /// Seconds, unlike the ladder stream durations.
    #[serde(default)]
    pub duration: u64,
}
