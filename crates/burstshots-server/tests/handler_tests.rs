//! Router tests for the burst page against an in-memory photo library.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, NaiveDate, Utc};
use tower::ServiceExt;

use burstshots_core::{MediaItem, SearchDate, SearchRequest, SearchResponse};
use burstshots_photos::{BoxFuture, PhotoLibrary, PhotosError, PhotosResult};
use burstshots_server::{AppState, build_router};

/// Library returning one canned result and recording every request.
struct FakeLibrary {
    result: Mutex<Option<PhotosResult<SearchResponse>>>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl FakeLibrary {
    fn new(result: PhotosResult<SearchResponse>) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Some(result)),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl PhotoLibrary for FakeLibrary {
    fn name(&self) -> &str {
        "fake"
    }

    fn search(&self, request: SearchRequest) -> BoxFuture<'_, PhotosResult<SearchResponse>> {
        self.requests.lock().unwrap().push(request);
        let result = self
            .result
            .lock()
            .unwrap()
            .take()
            .expect("one search per request");
        Box::pin(async move { result })
    }

    fn is_authenticated(&self) -> bool {
        true
    }
}

fn item(id: &str, creation_time: &str) -> MediaItem {
    MediaItem::new(
        id,
        format!("https://lh3.example.com/{id}"),
        format!("https://photos.example.com/{id}"),
    )
    .with_creation_time(creation_time)
}

fn burst_items() -> Vec<MediaItem> {
    vec![
        item("a", "2020-01-01T10:00:00Z"),
        item("b", "2020-01-01T10:00:00Z"),
        item("c", "2020-01-01T10:00:00Z"),
        item("d", "2020-01-01T11:00:00Z"),
    ]
}

fn app(library: Arc<FakeLibrary>) -> Router {
    build_router(AppState::new(library))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, location, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn renders_burst_groups() {
    let library = FakeLibrary::new(Ok(SearchResponse::with_items(burst_items())));
    let (status, _, body) = get(app(library.clone()), "/?startDate=2023-06-15").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.matches("<h3>Burst group at").count(), 1);
    assert!(body.contains("<h3>Burst group at 2020-01-01T10:00</h3>"));
    assert_eq!(body.matches("<img ").count(), 3);
    assert!(!body.contains("https://lh3.example.com/d"));
    assert!(body.contains("<h1>Burst Groups (before 2023-06-15)</h1>"));

    let requests = library.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].page_size, 100);
    assert_eq!(requests[0].page_token, None);
    assert_eq!(requests[0].date_range.start_date.year, 2008);
    assert_eq!(requests[0].date_range.end_date.year, 2023);
}

#[tokio::test]
async fn invalid_parameters_fall_back_to_defaults() {
    let library = FakeLibrary::new(Ok(SearchResponse::with_items(burst_items())));
    let (status, _, body) = get(
        app(library.clone()),
        "/?page=-4&groupCount=abc&startDate=yesterday&pageToken=",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<span style='margin-left:20px;'>Page 1</span>"));
    assert!(body.contains("name='groupCount' min='2' value='2'"));
    assert!(!body.contains("Previous"));

    let default_start = Utc::now().date_naive() - Duration::days(30);
    let request = &library.requests()[0];
    assert_eq!(request.page_token, None);
    assert_eq!(request.date_range.end_date, SearchDate::from(default_start));
}

#[tokio::test]
async fn repeated_key_keeps_other_parameters() {
    let library = FakeLibrary::new(Ok(SearchResponse::with_items(burst_items())));
    let (status, _, body) = get(
        app(library.clone()),
        "/?startDate=2015-05-05&pageToken=TOK&page=2&page=3",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<span style='margin-left:20px;'>Page 2</span>"));

    let request = &library.requests()[0];
    assert_eq!(request.page_token.as_deref(), Some("TOK"));
    assert_eq!(
        request.date_range.end_date,
        SearchDate::from(NaiveDate::from_ymd_opt(2015, 5, 5).unwrap())
    );
}

#[tokio::test]
async fn group_count_below_two_is_clamped() {
    let library = FakeLibrary::new(Ok(SearchResponse::with_items(vec![
        item("a", "2020-01-01T10:00:00Z"),
        item("b", "2020-01-01T11:00:00Z"),
    ])));
    let (status, _, body) = get(app(library), "/?groupCount=0&startDate=2023-06-15").await;

    // A singleton group would survive a threshold of 0 or 1
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("<h3>"));
}

#[tokio::test]
async fn empty_page_with_token_redirects_to_same_page() {
    let library = FakeLibrary::new(Ok(SearchResponse::default().with_next_page_token("T2")));
    let (status, location, _) = get(
        app(library.clone()),
        "/?page=3&startDate=2023-06-15&groupCount=4&pageToken=T1",
    )
    .await;

    assert_eq!(status, StatusCode::FOUND);
    insta::assert_snapshot!(
        location.unwrap(),
        @"/?pageToken=T2&startDate=2023-06-15&groupCount=4&page=3"
    );
    assert_eq!(library.requests()[0].page_token.as_deref(), Some("T1"));
}

#[tokio::test]
async fn empty_last_page_renders_date_picker() {
    let library = FakeLibrary::new(Ok(SearchResponse::default()));
    let (status, location, body) = get(app(library), "/?startDate=2023-06-15").await;

    assert_eq!(status, StatusCode::OK);
    assert!(location.is_none());
    assert!(body.contains("<h2>No media items found before 2023-06-15.</h2>"));
    assert!(body.contains("type='date' name='startDate' value='2023-06-15'"));
}

#[tokio::test]
async fn no_groups_with_token_redirects_to_next_page() {
    let library = FakeLibrary::new(Ok(SearchResponse::with_items(vec![
        item("a", "2020-01-01T10:00:00Z"),
        item("b", "2020-01-01T10:05:00Z"),
    ])
    .with_next_page_token("T3")));
    let (status, location, _) = get(app(library), "/?page=2&startDate=2023-06-15").await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(
        location.as_deref(),
        Some("/?pageToken=T3&startDate=2023-06-15&groupCount=2&page=3")
    );
}

#[tokio::test]
async fn no_groups_without_token_renders_empty_page() {
    let library = FakeLibrary::new(Ok(SearchResponse::with_items(vec![item(
        "a",
        "2020-01-01T10:00:00Z",
    )])));
    let (status, _, body) = get(app(library), "/?page=2&startDate=2023-06-15").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("<h3>"));
    assert!(!body.contains("Next Page"));
    assert_eq!(body.matches("&lt; Previous").count(), 2);
}

#[tokio::test]
async fn next_control_follows_token_not_groups() {
    let library = FakeLibrary::new(Ok(
        SearchResponse::with_items(burst_items()).with_next_page_token("T4")
    ));
    let (status, _, body) = get(app(library), "/?startDate=2023-06-15").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.matches("Next Page &gt;").count(), 2);
    assert!(body.contains("<input type='hidden' name='pageToken' value='T4' />"));
    assert!(body.contains("<input type='hidden' name='page' value='2' />"));
    assert!(!body.contains("Previous"));
}

#[tokio::test]
async fn search_failure_is_500() {
    let library = FakeLibrary::new(Err(
        PhotosError::authentication("token revoked").with_provider("fake")
    ));
    let (status, location, body) = get(app(library), "/").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(location.is_none());
    assert!(body.contains("token revoked"));
}

#[tokio::test]
async fn start_date_accepts_rfc3339() {
    let library = FakeLibrary::new(Ok(SearchResponse::default()));
    let (_, _, body) = get(app(library.clone()), "/?startDate=2022-02-28T23:00:00Z").await;

    assert!(body.contains("before 2022-02-28"));
    assert_eq!(
        library.requests()[0].date_range.end_date,
        SearchDate::from(NaiveDate::from_ymd_opt(2022, 2, 28).unwrap())
    );
}
