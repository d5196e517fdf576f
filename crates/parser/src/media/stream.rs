use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One selectable video rendition.
///
/// Within a descriptor's `video_streams`, quality buckets are unique
/// after deduplication and ordering is strictly descending by priority.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StreamVariant {
    /// Platform-native quality id (douyin `quality_type`, bilibili `qn` id).
    pub quality_id: i64,
    /// Display name, e.g. `高清`, `1080P 高清`.
    pub display_name: String,
    /// Coarse quality bucket, e.g. `720P`. Deduplication key for douyin.
    pub short_label: String,
    pub url: String,
    pub backup_urls: Vec<String>,
    /// Bits per second.
    pub bitrate: u64,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    /// Human-formatted estimated size (`12.3MB`, `未知`).
    pub size: String,
    pub size_bytes: u64,
    pub priority: i32,
}

/// Audio track accompanying a descriptor. Either an independent music
/// stream or the best DASH audio rendition; for platforms without a
/// separate track this points at the video URL (`is_video_audio`).
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AudioStream {
    pub url: String,
    pub backup_urls: Vec<String>,
    pub title: String,
    pub author: String,
    /// Seconds.
    pub duration: u64,
    pub bitrate: u64,
    pub uri: String,
    pub is_video_audio: bool,
}

/// Deduplicate by resolution bucket (`short_label`), keeping the variant
/// with the largest estimated size per bucket, then order by descending
/// priority.
pub fn dedup_by_bucket(mut streams: Vec<StreamVariant>) -> Vec<StreamVariant> {
    streams.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut best: FxHashMap<String, StreamVariant> = FxHashMap::default();
    for stream in streams {
        match best.get(&stream.short_label) {
            Some(existing) if existing.size_bytes >= stream.size_bytes => {}
            _ => {
                best.insert(stream.short_label.clone(), stream);
            }
        }
    }

    let mut unique: Vec<StreamVariant> = best.into_values().collect();
    unique.sort_by(|a, b| b.priority.cmp(&a.priority));
    unique
}

/// Deduplicate by platform quality id, keeping the first occurrence
/// after a descending-priority sort.
pub fn dedup_by_quality_id(mut streams: Vec<StreamVariant>) -> Vec<StreamVariant> {
    streams.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut seen = std::collections::HashSet::new();
    streams.retain(|s| seen.insert(s.quality_id));
    streams
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(short: &str, priority: i32, size_bytes: u64, quality_id: i64) -> StreamVariant {
        StreamVariant {
            quality_id,
            display_name: short.to_string(),
            short_label: short.to_string(),
            url: format!("https://cdn.example/{short}/{size_bytes}"),
            backup_urls: vec![],
            bitrate: 0,
            width: 0,
            height: 0,
            codec: None,
            size: String::new(),
            size_bytes,
            priority,
        }
    }

    #[test]
    fn bucket_dedup_keeps_largest_per_bucket_sorted_by_priority() {
        let streams = vec![
            variant("720P", 2, 100, 1),
            variant("720P", 2, 300, 2),
            variant("1080P", 3, 500, 3),
            variant("540P", 1, 50, 4),
            variant("1080P", 3, 400, 5),
        ];

        let unique = dedup_by_bucket(streams);

        assert_eq!(unique.len(), 3);
        assert_eq!(unique[0].short_label, "1080P");
        assert_eq!(unique[0].size_bytes, 500);
        assert_eq!(unique[1].short_label, "720P");
        assert_eq!(unique[1].size_bytes, 300);
        assert_eq!(unique[2].short_label, "540P");
        assert!(unique.windows(2).all(|w| w[0].priority >= w[1].priority));
    }

    #[test]
    fn quality_id_dedup_keeps_first_after_sort() {
        let streams = vec![
            variant("720P", 64, 0, 64),
            variant("1080P", 80, 0, 80),
            variant("1080P", 80, 0, 80),
            variant("360P", 16, 0, 16),
        ];

        let unique = dedup_by_quality_id(streams);

        assert_eq!(
            unique.iter().map(|s| s.quality_id).collect::<Vec<_>>(),
            vec![80, 64, 16]
        );
    }
}
