//! Scraper trait and the MangaReader-theme implementation.
//!
//! Extraction routines are pure functions over HTML or JSON text and live in
//! the submodules; the scraper ties them to HTTP fetching.

pub mod chapter;
pub mod images;
pub mod series;
pub mod thumbnail;

pub use chapter::{ChapterImageResult, alternate_chapter_url, fetch_chapter_page};
pub use images::{ScrapedImageSet, card_url, extract_from_embedded_reader, extract_from_img_tags};
pub use series::{
    ChapterLink, ListingPage, SearchResult, SeriesCard, SeriesDetail, SeriesListing, SeriesPage,
    SeriesQuery,
};
pub use thumbnail::resolve_thumbnail;

use crate::config::{Config, ScrapingConfig};
use crate::error::ScraperError;
use crate::validator::ImageAllowList;
use async_trait::async_trait;
use futures::future::join_all;
use regex::Regex;
use std::time::Duration;
use url::Url;

/// Trait for series sources.
///
/// Each implementation handles one site layout and provides the operations
/// the HTTP endpoints are built on.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Returns the human-readable name of this scraper.
    fn name(&self) -> &'static str;

    /// Returns the identifier used in logs (lowercase, no spaces).
    fn id(&self) -> &'static str;

    /// Fetches one page of series cards.
    async fn get_series_list(&self, query: &SeriesQuery) -> Result<SeriesPage, ScraperError>;

    /// Fetches metadata and the chapter list for the series at `slug`.
    async fn get_series_detail(&self, slug: &str) -> Result<SeriesDetail, ScraperError>;

    /// Runs a site search.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ScraperError>;

    /// Fetches a chapter page and recovers its page images.
    async fn fetch_chapter_images(
        &self,
        chapter_url: &str,
    ) -> Result<ChapterImageResult, ScraperError>;

    /// Recovers page images from a reader `sources` payload given directly.
    fn chapter_images_from_sources(&self, input: &str) -> Result<ChapterImageResult, ScraperError>;

    /// Fetches any page and collects image links from `<img>` tags and the
    /// embedded reader payload.
    async fn scrape_page(&self, url: &str) -> Result<ScrapedImageSet, ScraperError>;

    /// Collects image links from raw text containing a reader payload.
    fn scrape_input(&self, input: &str) -> ScrapedImageSet {
        extract_from_embedded_reader(input)
    }

    /// Resolves the representative image of a page. Failures yield `None`.
    async fn fetch_thumbnail(&self, url: &str) -> Option<String>;
}

/// Scraper for sites running the MangaReader WordPress theme.
pub struct MangaReaderScraper {
    client: reqwest::Client,
    base_url: Url,
    allow_list: ImageAllowList,
    chapter_image_pattern: Regex,
}

impl MangaReaderScraper {
    /// Creates a scraper from the application configuration.
    pub fn new(config: &Config) -> Result<Self, ScraperError> {
        let base_url = Url::parse(&config.scraping.base_url)
            .map_err(|e| ScraperError::InvalidUrl(format!("{}: {}", config.scraping.base_url, e)))?;
        let allow_list = ImageAllowList::from_config(&config.images);
        let chapter_image_pattern = chapter::chapter_image_pattern(&allow_list)?;

        Ok(Self {
            client: create_http_client(&config.scraping)?,
            base_url,
            allow_list,
            chapter_image_pattern,
        })
    }

    /// Fetches a page and returns its body, failing on non-success statuses.
    async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        tracing::debug!(scraper = self.id(), url, "fetching page");
        let response = self.client.get(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound(url.to_string()));
        }

        Ok(response.error_for_status()?.text().await?)
    }

    fn series_url(&self, slug: &str) -> Result<Url, ScraperError> {
        let slug = slug.trim().trim_matches('/');
        if slug.is_empty() || slug.contains(['/', '?', '#']) || slug == ".." {
            return Err(ScraperError::InvalidUrl(format!("invalid series slug: {}", slug)));
        }

        self.base_url
            .join(&format!("manga/{}/", slug))
            .map_err(|e| ScraperError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl Scraper for MangaReaderScraper {
    fn name(&self) -> &'static str {
        "MangaReader"
    }

    fn id(&self) -> &'static str {
        "mangareader"
    }

    async fn get_series_list(&self, query: &SeriesQuery) -> Result<SeriesPage, ScraperError> {
        let url = query
            .listing_url(&self.base_url)
            .map_err(|e| ScraperError::InvalidUrl(e.to_string()))?;
        let html = self.fetch_page(url.as_str()).await?;

        let series::ListingPage {
            listings,
            total_pages,
        } = series::extract_listing_page(&html, &self.base_url, query.limit);

        // One thumbnail fetch per card, joined so results stay in card order.
        let thumbnails = join_all(listings.iter().map(|listing| async move {
            match listing.series_url.as_deref() {
                Some(url) => self.fetch_thumbnail(url).await,
                None => None,
            }
        }))
        .await;

        let series = series::assemble_cards(listings, thumbnails);
        tracing::debug!(
            scraper = self.id(),
            page = query.page,
            cards = series.len(),
            "series list assembled"
        );

        Ok(SeriesPage {
            series,
            current_page: query.page,
            total_pages,
        })
    }

    async fn get_series_detail(&self, slug: &str) -> Result<SeriesDetail, ScraperError> {
        let url = self.series_url(slug)?;
        let html = self.fetch_page(url.as_str()).await?;
        Ok(series::extract_series_detail(&html))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ScraperError> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("s", query);

        let html = self.fetch_page(url.as_str()).await?;
        Ok(series::extract_search_results(&html, &self.base_url))
    }

    async fn fetch_chapter_images(
        &self,
        chapter_url: &str,
    ) -> Result<ChapterImageResult, ScraperError> {
        let response = fetch_chapter_page(&self.client, chapter_url).await?;
        tracing::debug!(
            scraper = self.id(),
            url = %response.url(),
            status = response.status().as_u16(),
            "chapter page fetched"
        );

        let html = response.text().await?;
        Ok(chapter::extract_chapter_images(
            &html,
            &self.chapter_image_pattern,
        ))
    }

    fn chapter_images_from_sources(
        &self,
        input: &str,
    ) -> Result<ChapterImageResult, ScraperError> {
        chapter::images_from_sources(input, &self.allow_list)
    }

    async fn scrape_page(&self, url: &str) -> Result<ScrapedImageSet, ScraperError> {
        let html = self.client.get(url).send().await?.text().await?;

        let mut data = extract_from_img_tags(&html);
        data.merge(extract_from_embedded_reader(&html));
        Ok(data)
    }

    async fn fetch_thumbnail(&self, url: &str) -> Option<String> {
        let html = match self.fetch_page(url).await {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!(url, %err, "thumbnail fetch failed");
                return None;
            }
        };

        resolve_thumbnail(&html)
    }
}

/// Common HTTP client configuration for scrapers.
pub fn create_http_client(config: &ScrapingConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .cookie_store(true);

    if let Some(secs) = config.request_timeout_sec {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scraper_for(server: &MockServer) -> MangaReaderScraper {
        let mut config = Config::default();
        config.scraping.base_url = format!("{}/", server.uri());
        config.images.allowed_hosts = vec!["cdn.test/storage".to_string()];
        MangaReaderScraper::new(&config).unwrap()
    }

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
    }

    fn series_page(image: &str) -> String {
        format!(r#"<html><head><meta property="og:image" content="{image}"></head></html>"#)
    }

    #[tokio::test]
    async fn test_series_list_fans_out_and_filters() {
        let server = MockServer::start().await;
        let listing = format!(
            r#"<div class="listupd">
              <div class="bs"><a href="{uri}/manga/alpha/"><div class="tt">Alpha</div><div class="epxs">Ch 5</div></a></div>
              <div class="bs"><a href="{uri}/manga/beta/"><div class="tt">Beta</div></a></div>
              <div class="bs"><a href="{uri}/manga/gamma/"><div class="tt">Gamma</div></a></div>
              <div class="bs"><a href="{uri}/manga/delta/"><div class="tt">Delta</div></a></div>
            </div>
            <div class="hpage"><span class="r">Page 2 of 9</span></div>"#,
            uri = server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/manga/"))
            .and(query_param("type", "manhwa"))
            .and(query_param("page", "2"))
            .respond_with(html(&listing))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/manga/alpha/"))
            .respond_with(html(&series_page("https://img.test/alpha.jpg")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/manga/beta/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/manga/gamma/"))
            .respond_with(html("<html><body>no image</body></html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/manga/delta/"))
            .respond_with(html(&series_page("https://img.test/delta.jpg")))
            .mount(&server)
            .await;

        let scraper = scraper_for(&server);
        let mut query = SeriesQuery::new("manhwa");
        query.page = 2;

        let page = scraper.get_series_list(&query).await.unwrap();
        assert_eq!(page.current_page, 2);
        assert_eq!(page.total_pages, 9);

        let titles: Vec<&str> = page.series.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Delta"]);
        assert_eq!(
            page.series[0].thumbnail.as_deref(),
            Some("https://img.test/alpha.jpg")
        );
        assert_eq!(
            page.series[0].url,
            format!("{}/alpha-chapter-01/", server.uri())
        );
        assert_eq!(page.series[0].latest_chapter, "Ch 5");
    }

    #[tokio::test]
    async fn test_series_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/manga/solo/"))
            .respond_with(html(
                r#"<div class="infox"><h1>Solo</h1></div>
                <div class="entry-content"><p>Synopsis.</p></div>
                <div class="thumb"><img src="https://img.test/solo.jpg"></div>
                <div class="bxcl"><ul><li><a href="https://x.test/solo-chapter-02/">Chapter 2</a></li>
                <li><a href="https://x.test/solo-chapter-01/">Chapter 1</a></li></ul></div>"#,
            ))
            .mount(&server)
            .await;

        let scraper = scraper_for(&server);
        let detail = scraper.get_series_detail("solo").await.unwrap();
        assert_eq!(detail.title, "Solo");
        assert_eq!(detail.description, "Synopsis.");
        assert_eq!(detail.thumbnail.as_deref(), Some("https://img.test/solo.jpg"));
        assert_eq!(detail.first_chapter().unwrap().title, "Chapter 1");
    }

    #[tokio::test]
    async fn test_series_detail_not_found_and_bad_slug() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/manga/missing/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let scraper = scraper_for(&server);
        assert!(matches!(
            scraper.get_series_detail("missing").await,
            Err(ScraperError::NotFound(_))
        ));
        assert!(matches!(
            scraper.get_series_detail("a/../b").await,
            Err(ScraperError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("s", "solo leveling"))
            .respond_with(html(
                r#"<div class="listupd"><div class="bs"><a href="/manga/solo/">
                <img src="https://img.test/s.jpg"><div class="tt">Solo</div><div class="epxs">Ch 9</div></a></div></div>"#,
            ))
            .mount(&server)
            .await;

        let scraper = scraper_for(&server);
        let results = scraper.search("solo leveling").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Solo");
        assert_eq!(
            results[0].url.as_deref(),
            Some(format!("{}/manga/solo/", server.uri()).as_str())
        );
        assert_eq!(results[0].latest_chapter, "Ch 9");
    }

    #[tokio::test]
    async fn test_fetch_chapter_images_with_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/solo-chapter-1/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/solo-chapter-01/"))
            .respond_with(html(
                r#"<div id="readerarea"><img src="https://cdn.test/storage/1.jpg"><img src="https://cdn.test/storage/2.jpg"></div>
                <script>ts_reader.run({"sources":[{"images":["https:\/\/cdn.test\/storage\/1.jpg"]}]});</script>"#,
            ))
            .mount(&server)
            .await;

        let scraper = scraper_for(&server);
        let result = scraper
            .fetch_chapter_images(&format!("{}/solo-chapter-1/", server.uri()))
            .await
            .unwrap();

        assert_eq!(
            result.images,
            vec!["https://cdn.test/storage/1.jpg", "https://cdn.test/storage/2.jpg"]
        );
    }

    #[tokio::test]
    async fn test_scrape_page_merges_passes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chapter"))
            .respond_with(html(
                r#"<img src="https://a.test/1/2/3/4/p.jpg"><img src="https://a.test/1/2/3/4/q.jpg">
                <script>ts_reader.run({"sources":[{"images":["https://b.test/x/y/z/w/1.png","https://a.test/1/2/3/4/p.jpg"]}]});</script>"#,
            ))
            .mount(&server)
            .await;

        let scraper = scraper_for(&server);
        let data = scraper
            .scrape_page(&format!("{}/chapter", server.uri()))
            .await
            .unwrap();

        assert_eq!(
            data.links,
            vec!["https://a.test/1/2/3/4/p.jpg", "https://b.test/x/y/z/w/1.png"]
        );
        assert_eq!(data.domains, vec!["a.test", "b.test"]);
        assert_eq!(
            data.card_urls,
            vec!["https://a.test/1/2/3/4", "https://b.test/x/y/z/w"]
        );
    }

    #[tokio::test]
    async fn test_fetch_thumbnail_swallows_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let scraper = scraper_for(&server);
        assert_eq!(
            scraper
                .fetch_thumbnail(&format!("{}/broken", server.uri()))
                .await,
            None
        );
        assert_eq!(scraper.fetch_thumbnail("http://127.0.0.1:1/nothing").await, None);
    }
}
