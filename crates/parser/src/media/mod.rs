pub mod descriptor;
pub mod extras;
pub mod format;
pub mod stream;

pub use descriptor::{Author, MediaDescriptor, Platform, StatCounter, Timestamp};
pub use extras::{
    BilibiliExtras, DouyinExtras, GameInfo, Hashtag, MixInfo, MusicInfo, PageInfo, Permissions,
    SeasonInfo, SubtitleInfo, XiaohongshuExtras,
};
pub use format::{format_count, format_size};
pub use stream::{AudioStream, StreamVariant, dedup_by_bucket, dedup_by_quality_id};
