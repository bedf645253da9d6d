use std::time::Duration;
use unicode_width::UnicodeWidthChar;

/// Cut `s` to at most `max` terminal columns, ending in `...` when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }

    let width: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if width <= max {
        return s.to_string();
    }

    if max <= 3 {
        return take_columns(s, max);
    }

    format!("{}...", take_columns(s, max - 3))
}

fn take_columns(s: &str, max: usize) -> String {
    let mut used = 0;
    s.chars()
        .take_while(|c| {
            used += c.width().unwrap_or(0);
            used <= max
        })
        .collect()
}

/// `1.4s`, `2m 05s`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{:.1}s", elapsed.as_secs_f64())
    } else {
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_input_untouched() {
        assert_eq!(truncate("tartex", 10), "tartex");
    }

    #[test]
    fn test_truncate_unicode_safe() {
        let input = "ééééé";
        assert_eq!(truncate(input, 4), "é...");
    }

    #[test]
    fn test_truncate_counts_wide_chars_as_two_columns() {
        let input = "こんにちは";
        assert_eq!(truncate(input, 3), "こ");
        assert_eq!(truncate(input, 7), "こん...");
        assert_eq!(truncate(input, 0), "");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(1400)), "1.4s");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2m 05s");
    }
}
