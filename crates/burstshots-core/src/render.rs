//! HTML rendering for the burst page.
//!
//! The page is plain HTML assembled into a `String`: a header, a block of
//! controls above and below the results, and one strip of thumbnails per
//! burst group. Every interpolated value goes through [`html_escape`].
//!
//! Redirect targets are built by [`redirect_location`] so the handler and
//! the tests agree on the exact query string.

use chrono::NaiveDate;

use crate::burst::{BurstGroup, MIN_BURST_SIZE};
use crate::query::{DATE_FORMAT, QueryState};

/// Size suffix appended to an item's base URL for thumbnails.
pub const THUMBNAIL_SUFFIX: &str = "=w200-h200";

/// Name of the browser window that permalinks open in.
pub const PERMALINK_TARGET: &str = "photodedup";

const PAGE_TITLE: &str = "Burst Shots";

/// Everything needed to render a page of burst groups.
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    pub state: &'a QueryState,
    pub groups: &'a [BurstGroup],
    pub next_page_token: Option<&'a str>,
}

impl PageView<'_> {
    /// Whether the Previous control is shown.
    pub fn has_previous(&self) -> bool {
        self.state.page > 1
    }
}

/// Where a control block sits on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlsPosition {
    Top,
    Bottom,
}

impl ControlsPosition {
    fn style(self) -> &'static str {
        match self {
            Self::Top => "margin-bottom:20px;",
            Self::Bottom => "margin-top:20px;",
        }
    }
}

/// Escapes text for use in HTML content and single- or double-quoted
/// attributes.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Thumbnail URL for an item's base URL.
pub fn thumbnail_url(base_url: &str) -> String {
    format!("{base_url}{THUMBNAIL_SUFFIX}")
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Builds the `Location` of a redirect to `/` that continues with `token`.
///
/// The start date and group count are carried over; `page` is whatever the
/// caller decides the next page number is.
pub fn redirect_location(state: &QueryState, token: &str, page: u32) -> String {
    format!(
        "/?pageToken={}&startDate={}&groupCount={}&page={}",
        urlencoding::encode(token),
        format_date(state.start_date),
        state.group_count,
        page
    )
}

/// Renders the page shown when the search returned nothing at all.
pub fn render_empty_page(start_date: NaiveDate) -> String {
    let date = html_escape(&format_date(start_date));
    let mut html = String::new();
    html.push_str(&format!(
        "<html><head><title>{PAGE_TITLE}</title></head><body>\n"
    ));
    html.push_str(&format!("<h2>No media items found before {date}.</h2>\n"));
    html.push_str(&format!(
        "<form method='get'><label>Start date: <input type='date' name='startDate' value='{date}'></label> \
         <button type='submit'>Go</button></form>\n"
    ));
    html.push_str("</body></html>\n");
    html
}

/// Renders the full burst page.
pub fn render_burst_page(view: &PageView<'_>) -> String {
    let date = html_escape(&view.state.start_date_param());
    let mut html = String::new();

    html.push_str(&format!(
        "<html><head><title>{PAGE_TITLE}</title></head><body>\n"
    ));
    html.push_str(&format!("<h1>Burst Groups (before {date})</h1>\n"));

    push_controls(&mut html, view, ControlsPosition::Top);
    for group in view.groups {
        push_group(&mut html, group);
    }
    push_controls(&mut html, view, ControlsPosition::Bottom);

    html.push_str("</body></html>\n");
    html
}

fn push_controls(html: &mut String, view: &PageView<'_>, position: ControlsPosition) {
    let state = view.state;
    let date = html_escape(&state.start_date_param());
    let group_count = state.group_count;
    let page = state.page;

    html.push_str(&format!("<div style='{}'>\n", position.style()));

    // Go form
    html.push_str(&format!(
        "<form method='get' style='display:inline;'>\
         <label>Start date: <input type='date' name='startDate' value='{date}'></label> \
         <label style='margin-left:10px;'>Minimum photos in burst group: \
         <input type='number' name='groupCount' min='{MIN_BURST_SIZE}' value='{group_count}' style='width:60px;'/></label> \
         <input type='number' name='page' min='1' value='{page}' style='width:60px;margin-left:10px;'/> \
         <button type='submit'>Go</button></form>\n"
    ));
    html.push_str(&format!(
        "<span style='margin-left:20px;'>Page {page}</span>\n"
    ));

    html.push_str("<form method='get' style='display:inline;margin-left:10px;'>\n");
    if view.has_previous() {
        push_hidden(html, "page", &(page - 1).to_string());
        push_hidden(html, "startDate", &date);
        push_hidden(html, "groupCount", &group_count.to_string());
        html.push_str("<button type='submit'>&lt; Previous</button>\n");
    }
    html.push_str("</form>\n");

    html.push_str("<form method='get' style='display:inline;margin-left:10px;'>\n");
    if let Some(token) = view.next_page_token {
        push_hidden(html, "pageToken", &html_escape(token));
        push_hidden(html, "startDate", &date);
        push_hidden(html, "groupCount", &group_count.to_string());
        push_hidden(html, "page", &page.saturating_add(1).to_string());
        html.push_str("<button type='submit'>Next Page &gt;</button>\n");
    }
    html.push_str("</form>\n");

    html.push_str("</div>\n");
}

/// `value` must already be escaped.
fn push_hidden(html: &mut String, name: &str, value: &str) {
    html.push_str(&format!(
        "<input type='hidden' name='{name}' value='{value}' />\n"
    ));
}

fn push_group(html: &mut String, group: &BurstGroup) {
    html.push_str(&format!(
        "<h3>Burst group at {}</h3><div style='display:flex;gap:10px;'>\n",
        html_escape(&group.key)
    ));
    for item in &group.items {
        html.push_str("<div style='text-align:center;'>\n");
        html.push_str(&format!(
            "<a href='{}' target='{PERMALINK_TARGET}'><img src='{}' \
             style='border:1px solid #ccc;max-width:200px;max-height:200px;'/></a><br/>\n",
            html_escape(&item.product_url),
            html_escape(&thumbnail_url(&item.base_url)),
        ));
        html.push_str("</div>\n");
    }
    html.push_str("</div>\n");
}
