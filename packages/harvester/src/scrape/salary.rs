//! Heuristic salary-text parsing.
//!
//! Listing cards advertise salary as free text ("от 150 000 до 200 000 ₽",
//! "from $3000", "100 000 – 150 000 руб."). The parser detects a currency
//! symbol or word, extracts digit groups, and interprets them via the
//! "from"/"to" markers of the source language (Russian and English).
//!
//! Policy: with two or more numbers, the first is `from` and the second
//! is `to`. With exactly one number and no marker, it is treated as a
//! point estimate assigned to `from`. With one number and only a "to"
//! marker, it is `to`.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::SalaryRange;

fn digit_groups() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Digit runs possibly grouped by regular, no-break, or narrow spaces.
    RE.get_or_init(|| Regex::new(r"\d[\d\s\u{00a0}\u{202f}]*").expect("valid regex"))
}

/// Parse a salary string from a listing card. Returns `None` when no
/// number can be found.
pub fn parse_salary(text: &str) -> Option<SalaryRange> {
    let lower = text.to_lowercase();

    let numbers: Vec<i64> = digit_groups()
        .find_iter(text)
        .filter_map(|m| {
            let digits: String = m.as_str().chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .collect();
    if numbers.is_empty() {
        return None;
    }

    // Markers must stand alone as words: "Доход" contains "до" but
    // carries no range meaning.
    let has_from = has_marker_word(&lower, &["от", "from"]);
    let has_to = has_marker_word(&lower, &["до", "to"]);

    let (from, to) = if numbers.len() >= 2 {
        (Some(numbers[0]), Some(numbers[1]))
    } else if has_to && !has_from {
        (None, Some(numbers[0]))
    } else {
        (Some(numbers[0]), None)
    };

    Some(SalaryRange {
        from,
        to,
        currency: detect_currency(&lower),
    })
}

fn has_marker_word(lower: &str, markers: &[&str]) -> bool {
    lower
        .split(|c: char| !c.is_alphabetic())
        .any(|token| markers.contains(&token))
}

fn detect_currency(lower: &str) -> Option<String> {
    if lower.contains('₽') || lower.contains("руб") || lower.contains("rur") {
        Some("RUR".to_string())
    } else if lower.contains('$') || lower.contains("usd") {
        Some("USD".to_string())
    } else if lower.contains('€') || lower.contains("eur") {
        Some("EUR".to_string())
    } else if lower.contains('₸') || lower.contains("kzt") {
        Some("KZT".to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_range_with_rubles() {
        let salary = parse_salary("от 150\u{00a0}000 до 200\u{00a0}000 ₽").unwrap();
        assert_eq!(salary.from, Some(150_000));
        assert_eq!(salary.to, Some(200_000));
        assert_eq!(salary.currency.as_deref(), Some("RUR"));
    }

    #[test]
    fn single_number_without_marker_is_from() {
        let salary = parse_salary("$3000").unwrap();
        assert_eq!(salary.from, Some(3000));
        assert_eq!(salary.to, None);
        assert_eq!(salary.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn to_marker_alone_sets_upper_bound() {
        let salary = parse_salary("до 90 000 руб.").unwrap();
        assert_eq!(salary.from, None);
        assert_eq!(salary.to, Some(90_000));
    }

    #[test]
    fn dash_range_without_markers() {
        let salary = parse_salary("100 000 – 150 000 руб.").unwrap();
        assert_eq!(salary.from, Some(100_000));
        assert_eq!(salary.to, Some(150_000));
    }

    #[test]
    fn text_without_numbers_is_none() {
        assert!(parse_salary("по договорённости").is_none());
    }

    #[test]
    fn marker_inside_a_word_does_not_count() {
        // "Доход" starts with "до" but is not an upper-bound marker.
        let salary = parse_salary("Доход 150 000 ₽").unwrap();
        assert_eq!(salary.from, Some(150_000));
        assert_eq!(salary.to, None);

        // "отличный" starts with "от" but is not a lower-bound marker.
        let salary = parse_salary("отличный оклад до 90 000 руб.").unwrap();
        assert_eq!(salary.from, None);
        assert_eq!(salary.to, Some(90_000));
    }
}
