//! Date normalization with the three-tier fallback that decides which date a
//! transaction is recorded under: parsed-from-text, then the caller's
//! received-time hint, then today.

use chrono::{Local, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

/// Formats tried in order; first success wins.
const DATE_FORMATS: &[&str] = &["%d/%m/%y", "%d/%m/%Y", "%Y-%m-%d"];

static SLASH_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{2}/\d{2}/\d{2,4}\b").expect("slash date regex"));
static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("iso date regex"));

/// Parse a date token into a calendar date, trying the known bank formats in
/// fixed order and finally chrono's free-form ISO parse.
pub fn to_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    s.parse::<NaiveDate>().ok()
}

/// Scan free text for the first recognizable date token: dd/MM/yy(yy) first,
/// then yyyy-MM-dd.
pub fn scan_date(text: &str) -> Option<NaiveDate> {
    if let Some(m) = SLASH_DATE_RE.find(text) {
        if let Some(d) = to_iso_date(m.as_str()) {
            return Some(d);
        }
    }
    ISO_DATE_RE.find(text).and_then(|m| to_iso_date(m.as_str()))
}

/// Three-tier fallback: parsed-from-text -> received-time hint -> today.
pub fn resolve_date(parsed: Option<NaiveDate>, hint: Option<NaiveDate>) -> NaiveDate {
    parsed
        .or(hint)
        .unwrap_or_else(|| Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_short_year_slash_format() {
        assert_eq!(to_iso_date("05/01/24"), Some(d(2024, 1, 5)));
    }

    #[test]
    fn test_long_year_slash_format() {
        assert_eq!(to_iso_date("05/01/2024"), Some(d(2024, 1, 5)));
    }

    #[test]
    fn test_iso_format() {
        assert_eq!(to_iso_date("2024-01-05"), Some(d(2024, 1, 5)));
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(to_iso_date("tomorrow"), None);
        assert_eq!(to_iso_date("99/99/99"), None);
    }

    #[test]
    fn test_scan_prefers_slash_token() {
        let text = "txn on 05/01/24 ref 2030-01-01";
        assert_eq!(scan_date(text), Some(d(2024, 1, 5)));
    }

    #[test]
    fn test_scan_falls_back_to_iso_token() {
        assert_eq!(scan_date("posted 2024-02-29 ok"), Some(d(2024, 2, 29)));
        assert_eq!(scan_date("no dates here"), None);
    }

    #[test]
    fn test_resolve_order() {
        let parsed = Some(d(2024, 1, 5));
        let hint = Some(d(2024, 2, 6));
        assert_eq!(resolve_date(parsed, hint), d(2024, 1, 5));
        assert_eq!(resolve_date(None, hint), d(2024, 2, 6));
        // No parsed date and no hint falls back to today.
        let today = Local::now().date_naive();
        assert_eq!(resolve_date(None, None), today);
    }
}
