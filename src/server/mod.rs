//! JSON HTTP API over the scraper.

pub mod error;
pub mod routes;

pub use error::ApiError;

use crate::alert::{Alert, Alerter, alerter_from_config, notify};
use crate::config::Config;
use crate::scrapers::{MangaReaderScraper, Scraper};
use anyhow::Context;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared, read-only request state.
#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<dyn Scraper>,
    pub alerter: Arc<dyn Alerter>,
}

impl AppState {
    pub fn new(scraper: Arc<dyn Scraper>, alerter: Arc<dyn Alerter>) -> Self {
        Self { scraper, alerter }
    }

    /// Builds the production state from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let scraper = MangaReaderScraper::new(config).context("Failed to create scraper")?;
        tracing::info!(
            scraper = scraper.name(),
            base_url = %config.scraping.base_url,
            "scraper ready"
        );
        let alerter: Arc<dyn Alerter> = Arc::from(alerter_from_config(&config.alerts));
        Ok(Self::new(Arc::new(scraper), alerter))
    }

    /// Logs `err`, alerts on 404/500 and hands it back for the response.
    pub async fn report(&self, err: ApiError, target: &str) -> ApiError {
        match &err {
            ApiError::BadRequest(message) => {
                tracing::debug!(target_url = target, %message, "rejected request");
            }
            ApiError::NotFound(message) => {
                tracing::warn!(target_url = target, %message, "no data found");
            }
            ApiError::Internal { message, details } => {
                tracing::error!(target_url = target, %message, %details, "request failed");
            }
        }

        if err.is_alertable() {
            let mut alert = Alert::new(err.to_string(), target);
            if let ApiError::Internal { details, .. } = &err {
                alert = alert.with_details(details.clone());
            }
            notify(self.alerter.as_ref(), &alert).await;
        }

        err
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/fetch-chapter", get(routes::fetch_chapter))
        .route("/fetch-series", get(routes::fetch_series))
        .route("/fetch-series-detail", get(routes::fetch_series_detail))
        .route("/scrape", get(routes::scrape))
        .route("/search", get(routes::search))
        .route("/test-telegram", get(routes::test_telegram))
}

/// Builds the router. Endpoints are served at the root and under `/api`.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .merge(api_routes())
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let app = build_app(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
