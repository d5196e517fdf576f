/// Quality labeling for the bitrate ladder.
///
/// `gear_name` values observed in the wild map to a display name, a
/// resolution bucket and a sort priority; unknown gears fall back to a
/// resolution-derived label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityInfo {
    pub name: &'static str,
    pub short: &'static str,
    pub priority: i32,
}

const fn q(name: &'static str, short: &'static str, priority: i32) -> QualityInfo {
    QualityInfo {
        name,
        short,
        priority,
    }
}

pub fn from_gear_name(gear_name: &str) -> Option<QualityInfo> {
    let info = match gear_name {
        "low" | "lower" => q("流畅", "360P", 0),
        "lowest" => q("极速", "240P", -1),
        "normal" => q("标清", "480P", 1),
        "high" => q("高清", "720P", 2),
        "higher" => q("超清", "1080P", 3),
        "highest" => q("蓝光", "1080P+", 4),
        "adapt_540_1" => q("清晰", "540P", 1),
        "adapt_720_1" => q("高清", "720P", 2),
        "adapt_1080_1" => q("超清", "1080P", 3),
        "adapt_2k_1" => q("2K", "2K", 4),
        "adapt_4k_1" => q("4K", "4K", 5),
        "adapt_low_540_0" => q("流畅", "540P", 1),
        "adapt_low_720_0" => q("流畅", "720P", 2),
        "adapt_low_1080_0" => q("流畅", "1080P", 3),
        "adapt_lower_540_1" => q("极速", "540P", 0),
        "adapt_lower_720_1" => q("极速", "720P", 1),
        "adapt_lower_1080_1" => q("极速", "1080P", 2),
        "adapt_lowest_540_1" => q("省流", "540P", 0),
        "adapt_lowest_720_1" => q("省流", "720P", 1),
        "adapt_lowest_1080_1" => q("省流", "1080P", 2),
        "low_540_0" => q("流畅", "540P", 1),
        "low_720_0" => q("流畅", "720P", 2),
        "low_1080_0" => q("流畅", "1080P", 3),
        "lower_540_0" => q("极速", "540P", 0),
        "lower_720_0" => q("极速", "720P", 1),
        "lower_1080_0" => q("极速", "1080P", 2),
        "normal_540_0" => q("标清", "540P", 1),
        "normal_720_0" => q("标清", "720P", 2),
        "normal_1080_0" => q("标清", "1080P", 3),
        _ => return None,
    };
    Some(info)
}

/// Label derived from resolution when the gear name is unrecognized.
/// Buckets by the short side, so 1920x1080 and portrait 1080x1920 both
/// land in 1080P. Returns an owned bucket string since sub-360P buckets
/// are synthesized.
pub fn from_resolution(width: u32, height: u32) -> (String, String, i32) {
    let resolution = if width.min(height) > 0 {
        width.min(height)
    } else {
        width.max(height)
    };
    let (name, short, priority) = if resolution >= 2160 {
        ("4K 超高清", "4K", 5)
    } else if resolution >= 1440 {
        ("2K 高清", "2K", 4)
    } else if resolution >= 1080 {
        ("超清", "1080P", 3)
    } else if resolution >= 720 {
        ("高清", "720P", 2)
    } else if resolution >= 540 {
        ("清晰", "540P", 1)
    } else if resolution >= 480 {
        ("标清", "480P", 1)
    } else if resolution >= 360 {
        ("流畅", "360P", 0)
    } else {
        return ("普通".to_string(), format!("{resolution}P"), 0);
    };
    (name.to_string(), short.to_string(), priority)
}

/// gear_name lookup with resolution fallback.
pub fn resolve(gear_name: &str, width: u32, height: u32) -> (String, String, i32) {
    match from_gear_name(gear_name) {
        Some(info) => (info.name.to_string(), info.short.to_string(), info.priority),
        None => from_resolution(width, height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_gear_names() {
        let info = from_gear_name("adapt_1080_1").unwrap();
        assert_eq!(info.short, "1080P");
        assert_eq!(info.priority, 3);
        assert!(from_gear_name("adapt_unknown_gear").is_none());
    }

    #[test]
    fn resolution_fallback_buckets() {
        assert_eq!(resolve("mystery_gear", 3840, 2160).1, "4K");
        assert_eq!(resolve("mystery_gear", 1920, 1080).1, "1080P");
        assert_eq!(resolve("mystery_gear", 320, 240).1, "240P");
    }

    // Orientation must not change the bucket.
    #[test]
    fn portrait_and_landscape_share_a_bucket() {
        assert_eq!(resolve("mystery_gear", 1080, 1920).1, "1080P");
        assert_eq!(resolve("mystery_gear", 720, 1280).1, "720P");
    }
}
