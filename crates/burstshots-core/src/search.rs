//! Search requests sent to the photo library.
//!
//! The burst page always asks for one page of [`PAGE_SIZE`] items inside a
//! single date range built by [`DateRange::backward_from`].

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::media::MediaItem;

/// Number of items requested per search.
pub const PAGE_SIZE: u32 = 100;

/// The year the lower bound of the search range is pinned to.
pub const LOWER_BOUND_YEAR: i32 = 2008;

/// A calendar date in the shape the search service expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<NaiveDate> for SearchDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

/// An inclusive date range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: SearchDate,
    pub end_date: SearchDate,
}

impl DateRange {
    /// Builds the range that searches backward from `start_date`.
    ///
    /// The lower bound keeps the month and day of `start_date` but its year
    /// is always [`LOWER_BOUND_YEAR`]; the upper bound is `start_date`
    /// itself. The day is copied as-is, so a February 29 start produces
    /// `2008-02-29` for the lower bound.
    pub fn backward_from(start_date: NaiveDate) -> Self {
        Self {
            start_date: SearchDate {
                year: LOWER_BOUND_YEAR,
                month: start_date.month(),
                day: start_date.day(),
            },
            end_date: start_date.into(),
        }
    }
}

/// One search call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub page_size: u32,
    pub page_token: Option<String>,
    pub date_range: DateRange,
}

impl SearchRequest {
    /// The burst page search: one full page backward from `start_date`.
    pub fn backward_from(start_date: NaiveDate, page_token: Option<String>) -> Self {
        Self {
            page_size: PAGE_SIZE,
            page_token,
            date_range: DateRange::backward_from(start_date),
        }
    }
}

/// Result of one search call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResponse {
    /// Items in service order. Empty when the service returned none.
    pub media_items: Vec<MediaItem>,
    /// Cursor for the next page, `None` on the last page.
    pub next_page_token: Option<String>,
}

impl SearchResponse {
    /// Creates a response with the given items and no next page.
    pub fn with_items(media_items: Vec<MediaItem>) -> Self {
        Self {
            media_items,
            next_page_token: None,
        }
    }

    /// Builder method to set the next page token. Empty tokens are ignored.
    pub fn with_next_page_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.next_page_token = (!token.is_empty()).then_some(token);
        self
    }
}
