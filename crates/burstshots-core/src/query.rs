//! Query state for the burst page.
//!
//! Every request carries its own state in the query string. Values that do
//! not parse, or fall outside their allowed range, are replaced silently so
//! that a hand-edited URL always produces a page.

use chrono::{DateTime, Duration, NaiveDate};

use crate::burst::MIN_BURST_SIZE;

/// How far back the start date defaults to when none is given.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Date format used by the `startDate` parameter and the date inputs.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Query parameters exactly as they arrived.
///
/// Every field is a string so that malformed input never rejects the
/// request; [`QueryState::resolve`] applies defaults and clamps.
#[derive(Debug, Clone, Default)]
pub struct RawQuery {
    pub page: Option<String>,
    pub start_date: Option<String>,
    pub group_count: Option<String>,
    pub page_token: Option<String>,
}

impl RawQuery {
    /// Collects the known parameters from decoded query pairs.
    ///
    /// A repeated key keeps its first value and never affects the other
    /// parameters. Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut raw = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "page" => &mut raw.page,
                "startDate" => &mut raw.start_date,
                "groupCount" => &mut raw.group_count,
                "pageToken" => &mut raw.page_token,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        raw
    }
}

/// The effective query state after defaulting and clamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    /// 1-indexed page number shown to the user.
    pub page: u32,
    /// Search backward from this date.
    pub start_date: NaiveDate,
    /// Minimum number of items for a group to count as a burst.
    pub group_count: u32,
    /// Cursor from the previous search response.
    pub page_token: Option<String>,
}

impl QueryState {
    /// Resolves raw parameters against `today` (UTC).
    pub fn resolve(raw: &RawQuery, today: NaiveDate) -> Self {
        Self {
            page: parse_page(raw.page.as_deref()),
            start_date: parse_start_date(raw.start_date.as_deref(), today),
            group_count: parse_group_count(raw.group_count.as_deref()),
            page_token: raw
                .page_token
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from),
        }
    }

    /// Returns the start date formatted as `yyyy-MM-dd`.
    pub fn start_date_param(&self) -> String {
        self.start_date.format(DATE_FORMAT).to_string()
    }
}

/// Parses the page number; anything missing, non-numeric or below 1 gives 1.
pub fn parse_page(value: Option<&str>) -> u32 {
    parse_clamped(value, 1)
}

/// Parses the burst size; anything missing, non-numeric or below 2 gives 2.
pub fn parse_group_count(value: Option<&str>) -> u32 {
    parse_clamped(value, MIN_BURST_SIZE)
}

fn parse_clamped(value: Option<&str>, min: u32) -> u32 {
    let parsed = value.and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(0);
    parsed.clamp(i64::from(min), i64::from(u32::MAX)) as u32
}

/// Parses the start date.
///
/// Accepts `yyyy-MM-dd` and full RFC 3339 timestamps (the date part is
/// used). Anything else falls back to [`default_start_date`].
pub fn parse_start_date(value: Option<&str>, today: NaiveDate) -> NaiveDate {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return default_start_date(today);
    };

    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .unwrap_or_else(|| default_start_date(today))
}

/// The default start date: [`DEFAULT_LOOKBACK_DAYS`] before `today`.
pub fn default_start_date(today: NaiveDate) -> NaiveDate {
    today - Duration::days(DEFAULT_LOOKBACK_DAYS)
}
