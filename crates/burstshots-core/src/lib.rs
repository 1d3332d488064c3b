//! Core logic: query state, burst grouping, search filters, HTML rendering

pub mod burst;
pub mod media;
pub mod query;
pub mod render;
pub mod search;
pub mod tracing;

pub use burst::{BURST_KEY_LEN, BurstGroup, MIN_BURST_SIZE, burst_key, group_bursts};
pub use media::MediaItem;
pub use query::{QueryState, RawQuery};
pub use render::{
    PageView, html_escape, redirect_location, render_burst_page, render_empty_page, thumbnail_url,
};
pub use search::{DateRange, PAGE_SIZE, SearchDate, SearchRequest, SearchResponse};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
