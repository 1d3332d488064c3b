//! The burst page handler.
//!
//! `GET /` resolves the query, runs exactly one search and answers with
//! either a `302` to the next useful page or the rendered HTML.

use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use chrono::Utc;
use tracing::{debug, info};

use burstshots_core::{
    PageView, QueryState, RawQuery, SearchRequest, SearchResponse, group_bursts,
    redirect_location, render_burst_page, render_empty_page,
};

use crate::AppState;
use crate::error::ServerResult;

/// GET /?page=&startDate=&groupCount=&pageToken=
///
/// Parameters are read pair by pair so one bad or repeated key only resets
/// that key. Unparseable query strings are treated like an empty one.
pub async fn burst_page(
    State(state): State<AppState>,
    query: Option<Query<Vec<(String, String)>>>,
) -> ServerResult<Response> {
    let raw = query
        .map(|Query(pairs)| RawQuery::from_pairs(pairs))
        .unwrap_or_default();
    let query = QueryState::resolve(&raw, Utc::now().date_naive());
    debug!(
        page = query.page,
        start_date = %query.start_date,
        group_count = query.group_count,
        has_token = query.page_token.is_some(),
        "burst page requested"
    );

    let request = SearchRequest::backward_from(query.start_date, query.page_token.clone());
    let response = state.library.search(request).await?;

    Ok(respond(&query, response))
}

/// Turns one search result into the page response.
pub fn respond(query: &QueryState, response: SearchResponse) -> Response {
    let SearchResponse {
        media_items,
        next_page_token,
    } = response;

    if media_items.is_empty() {
        return match next_page_token {
            // Same page number: nothing was shown for this one
            Some(token) => {
                info!("empty result page, skipping ahead");
                found(redirect_location(query, &token, query.page))
            }
            None => Html(render_empty_page(query.start_date)).into_response(),
        };
    }

    let item_count = media_items.len();
    let groups = group_bursts(media_items, query.group_count);
    debug!("{} items formed {} burst groups", item_count, groups.len());

    if groups.is_empty()
        && let Some(token) = next_page_token.as_deref()
    {
        info!("no burst groups on page {}, skipping ahead", query.page);
        return found(redirect_location(
            query,
            token,
            query.page.saturating_add(1),
        ));
    }

    Html(render_burst_page(&PageView {
        state: query,
        groups: &groups,
        next_page_token: next_page_token.as_deref(),
    }))
    .into_response()
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
