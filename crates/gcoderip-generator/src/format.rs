//! Number formatting for G-code words

/// Format a value with at most `decimals` places
///
/// Trailing zeros are trimmed but the decimal point is kept on whole
/// numbers (`10.`), except for zero which is written `0`.
pub fn format_number(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value);
    if !text.contains('.') {
        return if text == "-0" { "0".to_string() } else { text };
    }
    let trimmed = text.trim_end_matches('0');
    match trimmed {
        "." | "0." | "-." | "-0." => "0".to_string(),
        _ => trimmed.to_string(),
    }
}

/// Feed value as written: zero or negative feeds become the smallest
/// value representable at `decimals` places
pub fn format_feed(feed: f64, decimals: usize) -> String {
    let minimum = 10f64.powi(-(decimals as i32));
    format_number(if feed < minimum { minimum } else { feed }, decimals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0, 4), "10.");
        assert_eq!(format_number(0.0, 4), "0");
        assert_eq!(format_number(-0.00001, 4), "0");
        assert_eq!(format_number(1.23456, 4), "1.2346");
        assert_eq!(format_number(-2.5, 4), "-2.5");
        assert_eq!(format_number(0.5, 3), "0.5");
        assert_eq!(format_number(12.0, 0), "12");
        assert_eq!(format_number(-0.2, 0), "0");
    }

    #[test]
    fn test_format_feed() {
        assert_eq!(format_feed(100.0, 1), "100.");
        assert_eq!(format_feed(0.0, 1), "0.1");
        assert_eq!(format_feed(0.0, 0), "1");
        assert_eq!(format_feed(12.346, 2), "12.35");
    }
}
