//! Free-text date normalization.
//!
//! Biography text carries dates as bare years (`"1471"`), year ranges
//! (`"1471-1528"`, `"c. 1471 to 1528"`), and prose (`"21 May 1471"`). These
//! normalize to ISO `YYYY-MM-DD` ranges in a fixed priority order:
//!
//! 1. a bare 3–4 digit year ⇒ start = Jan 1 of that year, no end;
//! 2. one or two embedded 4-digit years ⇒ first is the start (Jan 1),
//!    second (if present) is the end (Dec 31);
//! 3. otherwise a general free-text parse where missing components fall back
//!    to the 1900-01-01 default epoch.
//!
//! Parse failure yields `None`; the caller's drop policy decides what that
//! means (no event for un-parseable dates).

use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static BARE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3,4}$").expect("static pattern"));
static EMBEDDED_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("static pattern"));

/// Free-text formats attempted by the general parse, most specific first.
const FREETEXT_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %Y",
    "%b %Y",
    "%d %B",
    "%B %d",
    "%B",
];

/// Default epoch completing any component a free-text parse leaves open.
const EPOCH_YEAR: i32 = 1900;

/// A normalized date range. The end is only present when explicitly
/// derivable from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Start date.
    pub start: NaiveDate,
    /// End date, when derivable.
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// ISO `YYYY-MM-DD` start date.
    #[must_use]
    pub fn start_iso(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// ISO `YYYY-MM-DD` end date, when present.
    #[must_use]
    pub fn end_iso(&self) -> Option<String> {
        self.end.map(|d| d.format("%Y-%m-%d").to_string())
    }
}

/// Normalize a free-text date expression.
#[must_use]
pub fn normalize(text: &str) -> Option<DateRange> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if BARE_YEAR.is_match(text) {
        let year: i32 = text.parse().ok()?;
        return Some(DateRange {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: None,
        });
    }

    let years: Vec<i32> = EMBEDDED_YEAR
        .find_iter(text)
        .take(2)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    if let Some(&first) = years.first() {
        let start = NaiveDate::from_ymd_opt(first, 1, 1)?;
        let end = years
            .get(1)
            .and_then(|&second| NaiveDate::from_ymd_opt(second, 12, 31));
        return Some(DateRange { start, end });
    }

    freetext(text).map(|start| DateRange { start, end: None })
}

/// General free-text parse with default-epoch completion.
fn freetext(text: &str) -> Option<NaiveDate> {
    for format in FREETEXT_FORMATS {
        let mut parsed = Parsed::new();
        if parse(&mut parsed, text, StrftimeItems::new(format)).is_err() {
            continue;
        }
        let year = parsed.year.unwrap_or(EPOCH_YEAR);
        let month = parsed.month.unwrap_or(1);
        let day = parsed.day.unwrap_or(1);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }
    None
}
