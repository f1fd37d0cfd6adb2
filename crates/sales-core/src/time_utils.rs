use chrono::{DateTime, NaiveDate, NaiveDateTime};

// ── Invoice timestamp parsing ─────────────────────────────────────────────────

/// Date-time patterns seen in retail exports, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only patterns; the time component becomes midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse an invoice timestamp into a naive date-time.
///
/// Accepts RFC 3339 (the offset is dropped, keeping the wall-clock time),
/// ISO-8601 with or without a `T` separator, slash-separated
/// `year/month/day` forms, US-style `month/day/year`
/// timestamps and bare dates. Returns `None` for anything unrecognised so
/// callers can keep the row with a null date.
pub fn parse_invoice_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Calendar year-month bucket key, e.g. `"2011-09"`.
///
/// Keys sort chronologically as plain strings for years 0000–9999.
pub fn year_month(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m").to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
