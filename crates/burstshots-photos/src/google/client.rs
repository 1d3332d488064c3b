//! Google Photos Library API client.
//!
//! Low-level HTTP client for `mediaItems:search`: builds the request body,
//! maps error statuses and converts the response into core types.

use std::time::Duration;

use burstshots_core::{DateRange, MediaItem, SearchRequest, SearchResponse};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PhotosError, PhotosResult};

/// Google Photos Library API client.
#[derive(Debug)]
pub struct GooglePhotosClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GooglePhotosClient {
    /// Creates a client for the API rooted at `base_url`.
    pub fn new(
        timeout: Duration,
        user_agent: &str,
        base_url: impl Into<String>,
    ) -> PhotosResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| PhotosError::internal("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Runs one `mediaItems:search` call.
    ///
    /// Only the requested page is fetched; following `next_page_token` is
    /// up to the caller.
    pub async fn search(
        &self,
        access_token: &str,
        request: &SearchRequest,
    ) -> PhotosResult<SearchResponse> {
        let url = format!("{}/v1/mediaItems:search", self.base_url);
        let body = ApiSearchBody::from(request);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PhotosError::network("request timeout")
                } else if e.is_connect() {
                    PhotosError::network(format!("connection failed: {}", e))
                } else {
                    PhotosError::network(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(PhotosError::rate_limited(format!(
                "rate limit exceeded{}",
                retry_after
                    .map(|s| format!(", retry after {} seconds", s))
                    .unwrap_or_default()
            )));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PhotosError::authentication(
                "access token expired or invalid",
            ));
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(PhotosError::authorization("access denied to photo library"));
        }

        if status == reqwest::StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(PhotosError::bad_request(format!(
                "search rejected: {}",
                body
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PhotosError::server(format!(
                "API error ({}): {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PhotosError::network(format!("failed to read response: {}", e)))?;

        let parsed: ApiSearchResponse = serde_json::from_str(&body).map_err(|e| {
            PhotosError::invalid_response(format!("failed to parse response: {}", e))
        })?;

        let media_items: Vec<MediaItem> = parsed
            .media_items
            .into_iter()
            .map(ApiMediaItem::into_media_item)
            .collect();
        debug!(
            "search returned {} items, more pages: {}",
            media_items.len(),
            parsed.next_page_token.is_some()
        );

        let mut result = SearchResponse::with_items(media_items);
        if let Some(token) = parsed.next_page_token {
            result = result.with_next_page_token(token);
        }
        Ok(result)
    }
}

/// Request body for `mediaItems:search`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiSearchBody<'a> {
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
    filters: ApiFilters,
}

impl<'a> From<&'a SearchRequest> for ApiSearchBody<'a> {
    fn from(request: &'a SearchRequest) -> Self {
        Self {
            page_size: request.page_size,
            page_token: request.page_token.as_deref(),
            filters: ApiFilters {
                date_filter: ApiDateFilter {
                    ranges: vec![request.date_range],
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiFilters {
    date_filter: ApiDateFilter,
}

#[derive(Debug, Serialize)]
struct ApiDateFilter {
    ranges: Vec<DateRange>,
}

/// Response from `mediaItems:search`. Both fields are omitted when empty.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSearchResponse {
    #[serde(default)]
    media_items: Vec<ApiMediaItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMediaItem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    product_url: String,
    #[serde(default)]
    base_url: String,
    mime_type: Option<String>,
    filename: Option<String>,
    media_metadata: Option<ApiMediaMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMediaMetadata {
    creation_time: Option<String>,
}

impl ApiMediaItem {
    /// Missing fields become empty strings; grouping decides what is shown.
    fn into_media_item(self) -> MediaItem {
        let mut item = MediaItem::new(self.id, self.base_url, self.product_url);
        if let Some(creation_time) = self.media_metadata.and_then(|m| m.creation_time) {
            item = item.with_creation_time(creation_time);
        }
        if let Some(filename) = self.filename {
            item = item.with_filename(filename);
        }
        if let Some(mime_type) = self.mime_type {
            item = item.with_mime_type(mime_type);
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::error::PhotosErrorCode;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(token: Option<&str>) -> SearchRequest {
        SearchRequest::backward_from(
            NaiveDate::from_ymd_opt(2023, 6, 15).unwrap(),
            token.map(String::from),
        )
    }

    fn client(server: &MockServer) -> GooglePhotosClient {
        GooglePhotosClient::new(Duration::from_secs(5), "burstshots-test", server.uri()).unwrap()
    }

    async fn respond_with(status: u16) -> (MockServer, PhotosError) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).insert_header("Retry-After", "30"))
            .mount(&server)
            .await;
        let err = client(&server)
            .search("token", &request(None))
            .await
            .unwrap_err();
        (server, err)
    }

    #[test]
    fn body_omits_missing_page_token() {
        let req = request(None);
        let json = serde_json::to_value(ApiSearchBody::from(&req)).unwrap();
        assert_eq!(json["pageSize"], 100);
        assert!(json.get("pageToken").is_none());
        assert_eq!(
            json["filters"]["dateFilter"]["ranges"][0]["startDate"]["year"],
            2008
        );
    }

    #[test]
    fn parse_search_response() {
        let json = r#"{
            "mediaItems": [
                {
                    "id": "a1",
                    "productUrl": "https://photos.google.com/lr/photo/a1",
                    "baseUrl": "https://lh3.googleusercontent.com/a1",
                    "mimeType": "image/jpeg",
                    "filename": "IMG_0001.JPG",
                    "mediaMetadata": {
                        "creationTime": "2020-01-01T10:00:00Z",
                        "width": "4032",
                        "height": "3024",
                        "photo": {}
                    }
                },
                {
                    "id": "a2",
                    "productUrl": "https://photos.google.com/lr/photo/a2",
                    "baseUrl": "https://lh3.googleusercontent.com/a2"
                }
            ],
            "nextPageToken": "next"
        }"#;

        let response: ApiSearchResponse = serde_json::from_str(json).unwrap();
        let items: Vec<MediaItem> = response
            .media_items
            .into_iter()
            .map(ApiMediaItem::into_media_item)
            .collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].creation_time.as_deref(), Some("2020-01-01T10:00:00Z"));
        assert_eq!(items[0].filename.as_deref(), Some("IMG_0001.JPG"));
        assert!(items[1].creation_time.is_none());
        assert_eq!(response.next_page_token.as_deref(), Some("next"));
    }

    #[test]
    fn item_without_id_is_kept() {
        let item: ApiMediaItem = serde_json::from_str(r#"{"baseUrl": "x"}"#).unwrap();
        let item = item.into_media_item();
        assert_eq!(item.id, "");
        assert_eq!(item.base_url, "x");
    }

    #[tokio::test]
    async fn page_of_id_less_items_is_not_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "mediaItems": [
                    {"baseUrl": "https://lh3/a", "mediaMetadata": {"creationTime": "2020-01-01T10:00:00Z"}},
                    {"baseUrl": "https://lh3/b", "mediaMetadata": {"creationTime": "2020-01-01T10:05:00Z"}}
                ],
                "nextPageToken": "more"
            })))
            .mount(&server)
            .await;

        let response = client(&server).search("t", &request(None)).await.unwrap();
        assert_eq!(response.media_items.len(), 2);
        assert_eq!(
            response.media_items[0].creation_time.as_deref(),
            Some("2020-01-01T10:00:00Z")
        );
        assert_eq!(response.next_page_token.as_deref(), Some("more"));
    }

    #[tokio::test]
    async fn search_posts_body_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/mediaItems:search"))
            .and(header("authorization", "Bearer secret-token"))
            .and(body_json(serde_json::json!({
                "pageSize": 100,
                "pageToken": "tok",
                "filters": {"dateFilter": {"ranges": [{
                    "startDate": {"year": 2008, "month": 6, "day": 15},
                    "endDate": {"year": 2023, "month": 6, "day": 15}
                }]}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "mediaItems": [{
                    "id": "a1",
                    "productUrl": "https://photos.google.com/lr/photo/a1",
                    "baseUrl": "https://lh3.googleusercontent.com/a1",
                    "mediaMetadata": {"creationTime": "2020-01-01T10:00:00Z"}
                }],
                "nextPageToken": ""
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .search("secret-token", &request(Some("tok")))
            .await
            .unwrap();
        assert_eq!(response.media_items.len(), 1);
        assert_eq!(response.media_items[0].id, "a1");
        assert!(response.next_page_token.is_none());
    }

    #[tokio::test]
    async fn empty_response_has_no_items() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let response = client(&server).search("t", &request(None)).await.unwrap();
        assert!(response.media_items.is_empty());
        assert!(response.next_page_token.is_none());
    }

    #[tokio::test]
    async fn status_codes_map_to_error_codes() {
        let (_s, err) = respond_with(401).await;
        assert_eq!(err.code(), PhotosErrorCode::AuthenticationFailed);

        let (_s, err) = respond_with(403).await;
        assert_eq!(err.code(), PhotosErrorCode::AuthorizationFailed);

        let (_s, err) = respond_with(400).await;
        assert_eq!(err.code(), PhotosErrorCode::BadRequest);

        let (_s, err) = respond_with(503).await;
        assert_eq!(err.code(), PhotosErrorCode::ServerError);
    }

    #[tokio::test]
    async fn rate_limit_reports_retry_after() {
        let (_s, err) = respond_with(429).await;
        assert_eq!(err.code(), PhotosErrorCode::RateLimited);
        assert!(err.message().contains("retry after 30 seconds"));
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server).search("t", &request(None)).await.unwrap_err();
        assert_eq!(err.code(), PhotosErrorCode::InvalidResponse);
    }
}
