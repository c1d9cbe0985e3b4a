//! Rewrites `.timestamp` elements into a human-readable local date-time.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use lazy_static::lazy_static;
use scraper::{Html, Selector};

use crate::dom::{self, PageEdits};

lazy_static! {
    static ref TIMESTAMP_SELECTOR: Selector = Selector::parse(".timestamp").unwrap();
}

// Naive shapes are interpreted in the local zone.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

pub fn parse_timestamp(text: &str) -> Option<DateTime<Local>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Local));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Local.from_local_datetime(&naive).single();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Local.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).single();
    }
    None
}

/// `"<long date>, <local time>"`, e.g. `Sun Jan 15 2023, 10:30:00 AM`.
pub fn format_timestamp(dt: &DateTime<Local>) -> String {
    format!("{}, {}", dt.format("%a %b %d %Y"), dt.format("%-I:%M:%S %p"))
}

/// Plan a text replacement for every `.timestamp` element whose content
/// parses as a date-time. Unparseable text is left alone and logged; one bad
/// element never aborts the rest of the pass.
///
/// Returns `(formatted, skipped)`.
pub fn format_timestamps(doc: &Html, edits: &mut PageEdits) -> (usize, usize) {
    let mut formatted = 0;
    let mut skipped = 0;
    for id in dom::select_ids(doc, &TIMESTAMP_SELECTOR) {
        let text = dom::element_text(doc, id);
        match parse_timestamp(&text) {
            Some(dt) => {
                edits.replace_text(id, format_timestamp(&dt));
                formatted += 1;
            }
            None => {
                log::warn!("unrecognized timestamp text {:?}, leaving as-is", text.trim());
                skipped += 1;
            }
        }
    }
    (formatted, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339() {
        assert!(parse_timestamp("2023-01-15T10:30:00Z").is_some());
        assert!(parse_timestamp("  2023-01-15T10:30:00+02:00 ").is_some());
    }

    #[test]
    fn parses_naive_and_date_only() {
        assert!(parse_timestamp("2023-01-15T10:30:00").is_some());
        assert!(parse_timestamp("2023-01-15 10:30:00").is_some());
        let midnight = parse_timestamp("2023-01-15").unwrap();
        assert_eq!(format_timestamp(&midnight), "Sun Jan 15 2023, 12:00:00 AM");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("sometime soon").is_none());
        assert!(parse_timestamp("15/01/2023").is_none());
    }

    #[test]
    fn formats_local_wall_clock() {
        let dt = Local.with_ymd_and_hms(2023, 1, 15, 10, 30, 0).single().unwrap();
        assert_eq!(format_timestamp(&dt), "Sun Jan 15 2023, 10:30:00 AM");
        let pm = Local.with_ymd_and_hms(2023, 1, 15, 22, 5, 9).single().unwrap();
        assert_eq!(format_timestamp(&pm), "Sun Jan 15 2023, 10:05:09 PM");
    }

    #[test]
    fn formatted_output_does_not_round_trip() {
        // the long form is display-only; a second pass skips it
        let dt = Local.with_ymd_and_hms(2023, 1, 15, 10, 30, 0).single().unwrap();
        assert!(parse_timestamp(&format_timestamp(&dt)).is_none());
    }
}
