//! Formatting helpers for the statistics report.
//!
//! - [`format_count`] - Format counts with K/M suffix (1.5K, 2.3M)
//! - [`format_count_with_separator`] - Format counts with thousands separator (1,234,567)
//! - [`percent_of`] - Share of a total, rounded to one decimal
//! - [`truncate`] - Truncate labels with ellipsis

/// Format a count with K/M suffix for compact display.
///
/// # Examples
/// ```
/// use iprange_analyser::utils::format_count;
/// assert_eq!(format_count(500), "500");
/// assert_eq!(format_count(1500), "1.5K");
/// assert_eq!(format_count(1_500_000), "1.5M");
/// ```
pub fn format_count(count: usize) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Format a number with thousands separators (commas).
///
/// # Examples
/// ```
/// use iprange_analyser::utils::format_count_with_separator;
/// assert_eq!(format_count_with_separator(1000), "1,000");
/// assert_eq!(format_count_with_separator(1234567), "1,234,567");
/// ```
pub fn format_count_with_separator(n: usize) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Percentage of `total` represented by `count`, rounded to one decimal.
///
/// Returns 0 for an empty total.
///
/// # Examples
/// ```
/// use iprange_analyser::utils::percent_of;
/// assert_eq!(percent_of(1, 3), 33.3);
/// assert_eq!(percent_of(5, 0), 0.0);
/// ```
pub fn percent_of(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Truncate a label to at most `max_len` characters, adding "..." if truncated.
///
/// Counts characters rather than bytes, so accented country and region
/// names are cut safely.
///
/// # Examples
/// ```
/// use iprange_analyser::utils::truncate;
/// assert_eq!(truncate("short", 10), "short");
/// assert_eq!(truncate("this is long", 10), "this is...");
/// ```
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1.0K");
        assert_eq!(format_count(1500), "1.5K");
        assert_eq!(format_count(999_999), "1000.0K");
        assert_eq!(format_count(1_000_000), "1.0M");
        assert_eq!(format_count(1_500_000), "1.5M");
    }

    #[test]
    fn test_format_count_with_separator() {
        assert_eq!(format_count_with_separator(0), "0");
        assert_eq!(format_count_with_separator(42), "42");
        assert_eq!(format_count_with_separator(999), "999");
        assert_eq!(format_count_with_separator(1000), "1,000");
        assert_eq!(format_count_with_separator(12345), "12,345");
        assert_eq!(format_count_with_separator(123456), "123,456");
        assert_eq!(format_count_with_separator(1234567), "1,234,567");
        assert_eq!(format_count_with_separator(1234567890), "1,234,567,890");
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(0, 10), 0.0);
        assert_eq!(percent_of(10, 10), 100.0);
        assert_eq!(percent_of(1, 3), 33.3);
        assert_eq!(percent_of(2, 3), 66.7);
        assert_eq!(percent_of(1, 0), 0.0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("test", 3), "...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("Côte d'Ivoire Lagunes", 10), "Côte d'...");
        assert_eq!(truncate("Réunion", 10), "Réunion");
    }
}
