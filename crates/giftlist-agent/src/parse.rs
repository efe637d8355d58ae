// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Validating parsers for typed user input.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use thiserror::Error;

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})\.(\d{1,2})(?:\.(\d{2,4}))?$").expect("valid date regex")
});

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid url regex"));

static DEEP_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"t\.me/\w+\?start=(.+)|start=(.+)").expect("valid deep link regex")
});

/// Why a typed date was rejected. The two cases get different replies.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DateError {
    /// The text does not look like `DD.MM[.YYYY]` at all.
    #[error("expected DD.MM.YYYY, DD.MM.YY or DD.MM")]
    BadFormat,
    /// Well-formed but not a calendar date, e.g. `31.02.2025`.
    #[error("no such calendar date")]
    InvalidDate,
}

/// Parse an event date typed by the owner.
///
/// Two-digit years map to 20YY; a missing year means the year of `today`.
/// Days never roll over into the next month.
pub fn parse_event_date(input: &str, today: NaiveDate) -> Result<NaiveDate, DateError> {
    let caps = DATE_RE.captures(input.trim()).ok_or(DateError::BadFormat)?;
    let day: u32 = caps[1].parse().map_err(|_| DateError::BadFormat)?;
    let month: u32 = caps[2].parse().map_err(|_| DateError::BadFormat)?;
    let year = match caps.get(3) {
        Some(y) => {
            let y: i32 = y.as_str().parse().map_err(|_| DateError::BadFormat)?;
            if y < 100 { 2000 + y } else { y }
        }
        None => today.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::InvalidDate)
}

/// Pull the first `http(s)://` URL out of `text`, falling back to the trimmed text.
pub fn extract_link(text: &str) -> String {
    match URL_RE.find(text) {
        Some(m) => m.as_str().to_string(),
        None => text.trim().to_string(),
    }
}

/// Turn a typed share reference into something storage can resolve.
///
/// Accepts a full deep link, a bare `start=<slug>` fragment, `@handle`, a
/// handle, a slug or a numeric id.
pub fn normalize_reference(input: &str) -> String {
    let mut reference = input.trim();
    if let Some(caps) = DEEP_LINK_RE.captures(reference)
        && let Some(m) = caps.get(1).or_else(|| caps.get(2))
    {
        reference = m.as_str().trim();
    }
    reference.strip_prefix('@').unwrap_or(reference).trim().to_string()
}

/// Whether an edit reply means "remove this value".
pub fn is_clear_input(text: &str) -> bool {
    matches!(text.trim(), "" | "—" | "-")
}

/// A priority typed as a digit in the add flow.
pub fn parse_priority_digit(text: &str) -> Option<u8> {
    match text.trim().parse::<u8>() {
        Ok(n @ 1..=5) => Some(n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::format_date_numeric;
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn accepts_all_three_shapes() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(parse_event_date("15.06.2025", today()), Ok(d(2025, 6, 15)));
        assert_eq!(parse_event_date("1.2.26", today()), Ok(d(2026, 2, 1)));
        assert_eq!(parse_event_date(" 07.11 ", today()), Ok(d(2025, 11, 7)));
    }

    #[test]
    fn distinguishes_format_from_calendar_errors() {
        assert_eq!(parse_event_date("31.02.2025", today()), Err(DateError::InvalidDate));
        assert_eq!(parse_event_date("00.05", today()), Err(DateError::InvalidDate));
        assert_eq!(parse_event_date("12.13.2025", today()), Err(DateError::InvalidDate));
        assert_eq!(parse_event_date("2025-06-15", today()), Err(DateError::BadFormat));
        assert_eq!(parse_event_date("завтра", today()), Err(DateError::BadFormat));
        assert_eq!(parse_event_date("15.06.20255", today()), Err(DateError::BadFormat));
    }

    #[test]
    fn leap_day_only_in_leap_years() {
        assert!(parse_event_date("29.02.2024", today()).is_ok());
        assert_eq!(parse_event_date("29.02.2025", today()), Err(DateError::InvalidDate));
    }

    #[test]
    fn link_extraction() {
        assert_eq!(
            extract_link("вот тут https://shop.example/item?id=5 посмотри"),
            "https://shop.example/item?id=5"
        );
        assert_eq!(extract_link("  магазин у дома "), "магазин у дома");
    }

    #[test]
    fn reference_normalization() {
        assert_eq!(normalize_reference("https://t.me/gift_bot?start=alice"), "alice");
        assert_eq!(normalize_reference("start=bob-2"), "bob-2");
        assert_eq!(normalize_reference("  @Carol "), "Carol");
        assert_eq!(normalize_reference("12345"), "12345");
        assert_eq!(normalize_reference("@"), "");
    }

    #[test]
    fn clear_markers() {
        assert!(is_clear_input("—"));
        assert!(is_clear_input(" - "));
        assert!(is_clear_input("   "));
        assert!(!is_clear_input("синий"));
    }

    #[test]
    fn priority_digits() {
        assert_eq!(parse_priority_digit("4"), Some(4));
        assert_eq!(parse_priority_digit("0"), None);
        assert_eq!(parse_priority_digit("6"), None);
        assert_eq!(parse_priority_digit("много"), None);
    }

    proptest! {
        #[test]
        fn formatted_dates_parse_back(days in 0i64..40_000) {
            let date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + chrono::Days::new(days as u64);
            let text = format_date_numeric(date);
            prop_assert_eq!(parse_event_date(&text, today()), Ok(date));
        }

        #[test]
        fn never_panics_on_arbitrary_input(s in "\\PC*") {
            let _ = parse_event_date(&s, today());
            let _ = normalize_reference(&s);
            let _ = extract_link(&s);
        }
    }
}
