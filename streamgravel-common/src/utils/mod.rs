use std::time::{Duration, Instant};

/// Formats the time elapsed since `instant`, e.g. `1min 4.215s` or `350ms`.
pub fn get_formatted_elapsed_time(instant: Instant) -> String {
    format_duration(instant.elapsed())
}

pub fn format_duration(dur: Duration) -> String {
    let minutes = dur.as_secs() / 60;
    let sub_sec = dur.as_secs() % 60;
    let sub_milli = dur.subsec_millis();
    if minutes > 0 {
        return format!("{}min {}.{:03}s", minutes, sub_sec, sub_milli);
    }
    if sub_sec > 0 {
        return format!("{}.{:03}s", sub_sec, sub_milli);
    }
    format!("{}ms", sub_milli)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(350)), "350ms");
        assert_eq!(format_duration(Duration::from_millis(4_015)), "4.015s");
        assert_eq!(format_duration(Duration::from_millis(64_215)), "1min 4.215s");
    }
}
