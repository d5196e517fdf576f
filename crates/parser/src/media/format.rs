//! Locale-style display formatting for counters and byte sizes.

/// Abbreviate a counter the way the platforms render it (`1.2万`, `3.4亿`).
pub fn format_count(count: u64) -> String {
    if count >= 100_000_000 {
        format!("{:.1}亿", count as f64 / 100_000_000.0)
    } else if count >= 10_000 {
        format!("{:.1}万", count as f64 / 10_000.0)
    } else {
        count.to_string()
    }
}

/// Human byte size; zero/unknown renders as `未知`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "未知".to_string();
    }

    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_below_ten_thousand_are_plain() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(9999), "9999");
    }

    #[test]
    fn counts_abbreviate_at_wan_and_yi() {
        assert_eq!(format_count(12_000), "1.2万");
        assert_eq!(format_count(340_000_000), "3.4亿");
    }

    #[test]
    fn sizes_scale_through_units() {
        assert_eq!(format_size(0), "未知");
        assert_eq!(format_size(512), "512.0B");
        assert_eq!(format_size(1536), "1.5KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0MB");
    }
}
