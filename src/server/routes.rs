//! Request handlers.

use super::{ApiError, AppState};
use crate::scrapers::{ChapterImageResult, ScrapedImageSet, SeriesPage, SeriesQuery};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};

/// Target reported in alerts when the request carried data instead of a URL.
const DIRECT_INPUT: &str = "Direct input";

const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct SourceParams {
    pub url: Option<String>,
    pub input: Option<String>,
}

impl SourceParams {
    /// Picks the source to use. Non-blank `input` wins over `url`.
    fn into_source(self) -> Option<Source> {
        match (required(self.input), required(self.url)) {
            (Some(input), _) => Some(Source::Input(input)),
            (None, Some(url)) => Some(Source::Url(url)),
            (None, None) => None,
        }
    }
}

/// Where the images of a request come from.
#[derive(Debug, PartialEq, Eq)]
enum Source {
    /// Data pasted by the client.
    Input(String),
    Url(String),
}

impl Source {
    /// What alerts name as the failing target.
    fn target(&self) -> &str {
        match self {
            Source::Input(_) => DIRECT_INPUT,
            Source::Url(url) => url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SeriesParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
}

impl SeriesParams {
    fn into_query(self, kind: String) -> SeriesQuery {
        let page = self
            .page
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1);
        let limit = self
            .limit
            .and_then(|l| l.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_LIMIT);

        SeriesQuery {
            kind,
            page,
            limit,
            status: self.status,
            order: self.order,
            search: self.search,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DetailParams {
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

/// Returns the parameter if present and not blank.
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `GET /fetch-chapter?url=` or `?input=`: the page images of one chapter.
pub async fn fetch_chapter(
    State(state): State<AppState>,
    Query(params): Query<SourceParams>,
) -> Result<Json<ChapterImageResult>, ApiError> {
    let Some(source) = params.into_source() else {
        return Err(ApiError::BadRequest(
            "URL or input data is required".to_string(),
        ));
    };
    let target = source.target();

    let result = match &source {
        Source::Input(input) => state.scraper.chapter_images_from_sources(input),
        Source::Url(url) => state.scraper.fetch_chapter_images(url).await,
    };

    match result {
        Ok(result) if result.is_empty() => Err(state
            .report(
                ApiError::NotFound("No images found from the specified source".to_string()),
                target,
            )
            .await),
        Ok(result) => Ok(Json(result)),
        Err(err) => Err(state
            .report(ApiError::from_scraper(&err, "Failed to fetch chapter"), target)
            .await),
    }
}

/// `GET /fetch-series`: one page of series cards.
pub async fn fetch_series(
    State(state): State<AppState>,
    Query(params): Query<SeriesParams>,
) -> Result<Json<SeriesPage>, ApiError> {
    let Some(kind) = required(params.kind.clone()) else {
        return Err(ApiError::BadRequest(
            "Type parameter is required".to_string(),
        ));
    };
    let query = params.into_query(kind);
    let target = format!("series listing: type={} page={}", query.kind, query.page);
    let not_found = "No manga found. Please try different filters or check back later.";

    match state.scraper.get_series_list(&query).await {
        Ok(page) if page.series.is_empty() => Err(state
            .report(ApiError::NotFound(not_found.to_string()), &target)
            .await),
        Ok(page) => Ok(Json(page)),
        Err(err) => {
            let api_err = match ApiError::from_scraper(&err, "Failed to fetch series") {
                ApiError::NotFound(_) => ApiError::NotFound(not_found.to_string()),
                other => other,
            };
            Err(state.report(api_err, &target).await)
        }
    }
}

/// `GET /fetch-series-detail?slug=`: metadata and chapters of one series.
pub async fn fetch_series_detail(
    State(state): State<AppState>,
    Query(params): Query<DetailParams>,
) -> Result<Json<Value>, ApiError> {
    let Some(slug) = required(params.slug) else {
        return Err(ApiError::BadRequest(
            "Slug parameter is required".to_string(),
        ));
    };

    match state.scraper.get_series_detail(&slug).await {
        Ok(series) => Ok(Json(json!({ "series": series }))),
        Err(err) => Err(state
            .report(
                ApiError::from_scraper(&err, "Failed to fetch series detail."),
                &format!("series: {}", slug),
            )
            .await),
    }
}

/// `GET /scrape?url=` or `?input=`: image links, hosts and card URLs.
pub async fn scrape(
    State(state): State<AppState>,
    Query(params): Query<SourceParams>,
) -> Result<Json<ScrapedImageSet>, ApiError> {
    match params.into_source() {
        Some(Source::Input(input)) => Ok(Json(state.scraper.scrape_input(&input))),
        Some(Source::Url(url)) => match state.scraper.scrape_page(&url).await {
            Ok(data) => Ok(Json(data)),
            Err(err) => Err(state
                .report(
                    ApiError::from_scraper(&err, "Failed to scrape the content"),
                    &url,
                )
                .await),
        },
        None => Err(ApiError::BadRequest(
            "URL or input data is required".to_string(),
        )),
    }
}

/// `GET /search?query=`: site search.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let Some(query) = required(params.query) else {
        return Err(ApiError::BadRequest("Search query is required".to_string()));
    };

    match state.scraper.search(&query).await {
        Ok(results) => Ok(Json(json!({ "results": results }))),
        Err(err) => Err(state
            .report(
                ApiError::from_scraper(&err, "Failed to perform search"),
                &format!("search: {}", query),
            )
            .await),
    }
}

/// `GET /test-telegram`: sends a test message through the alert channel.
pub async fn test_telegram(State(state): State<AppState>) -> Response {
    let message = "<b>Test Message</b>\nTelegram bot integration is working!";

    match state.alerter.send_message(message).await {
        Ok(()) => Json(json!({
            "success": true,
            "message": "Test message sent successfully"
        }))
        .into_response(),
        Err(err) => {
            tracing::error!(%err, "test message failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
