//! Chapter page fetching and page image recovery.
//!
//! The source site is inconsistent about zero-padding chapter numbers in
//! URLs (`-chapter-1/` vs `-chapter-01/`), so a 404 is retried once with the
//! padding toggled.

use super::images::reader_source_images;
use crate::error::ScraperError;
use crate::validator::ImageAllowList;
use regex::Regex;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Page images of one chapter, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterImageResult {
    pub images: Vec<String>,
}

impl ChapterImageResult {
    fn collect_unique<'a>(images: impl IntoIterator<Item = &'a str>) -> Self {
        let mut result = Self::default();
        for image in images {
            let image = unescape_slashes(image);
            if !result.images.contains(&image) {
                result.images.push(image);
            }
        }
        result
    }

    /// Returns true if no image was found.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Computes the retry URL for a chapter page that returned 404.
///
/// The token after the last `-` (ignoring one trailing `/`) is rewritten: a
/// two-character token with a leading zero loses it, anything else is
/// left-padded with `0` to two characters. Returns `None` if the URL has no
/// `-`.
pub fn alternate_chapter_url(url: &str) -> Option<String> {
    let (body, trailing) = match url.strip_suffix('/') {
        Some(body) => (body, "/"),
        None => (url, ""),
    };

    let (prefix, token) = body.rsplit_once('-')?;

    let replacement = if token.chars().count() == 2 && token.starts_with('0') {
        token[1..].to_string()
    } else {
        format!("{:0>2}", token)
    };

    Some(format!("{}-{}{}", prefix, replacement, trailing))
}

/// Fetches a chapter page, retrying once with the alternate chapter URL on 404.
///
/// The retried response is returned whatever its status.
pub async fn fetch_chapter_page(
    client: &reqwest::Client,
    url: &str,
) -> Result<reqwest::Response, ScraperError> {
    let response = client.get(url).send().await?;
    if response.status() != StatusCode::NOT_FOUND {
        return Ok(response);
    }

    let Some(alternate) = alternate_chapter_url(url) else {
        return Ok(response);
    };

    tracing::debug!(url, %alternate, "chapter page not found, retrying");
    Ok(client.get(&alternate).send().await?)
}

/// Builds the pattern matching allow-listed image URLs in raw page text.
pub fn chapter_image_pattern(allow_list: &ImageAllowList) -> Result<Regex, ScraperError> {
    let hosts = allow_list
        .entries()
        .iter()
        .map(|entry| regex::escape(entry))
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&format!(r#"https?://(?:{})/[^"'\s]+"#, hosts))
        .map_err(|e| ScraperError::ParseError(format!("invalid image allow-list pattern: {}", e)))
}

/// Extracts allow-listed image URLs from the raw text of a chapter page.
pub fn extract_chapter_images(html: &str, pattern: &Regex) -> ChapterImageResult {
    ChapterImageResult::collect_unique(pattern.find_iter(html).map(|m| m.as_str()))
}

/// Extracts allow-listed images from a reader `sources` payload given directly.
pub fn images_from_sources(
    input: &str,
    allow_list: &ImageAllowList,
) -> Result<ChapterImageResult, ScraperError> {
    let data: JsonValue = serde_json::from_str(input)?;

    Ok(ChapterImageResult::collect_unique(
        reader_source_images(&data)
            .into_iter()
            .filter(|image| allow_list.is_valid_image_url(image)),
    ))
}

fn unescape_slashes(url: &str) -> String {
    url.replace("\\/", "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_alternate_strips_zero() {
        assert_eq!(
            alternate_chapter_url("https://site.test/title-chapter-01/").as_deref(),
            Some("https://site.test/title-chapter-1/")
        );
    }

    #[test]
    fn test_alternate_adds_zero() {
        assert_eq!(
            alternate_chapter_url("https://site.test/title-chapter-1/").as_deref(),
            Some("https://site.test/title-chapter-01/")
        );
        assert_eq!(
            alternate_chapter_url("https://site.test/title-chapter-7").as_deref(),
            Some("https://site.test/title-chapter-07")
        );
    }

    #[test]
    fn test_alternate_rewrites_only_last_token() {
        assert_eq!(
            alternate_chapter_url("https://site.test/solo-01-chapter-01/").as_deref(),
            Some("https://site.test/solo-01-chapter-1/")
        );
    }

    #[test]
    fn test_alternate_wide_tokens_unchanged() {
        // Padding to two characters leaves longer numbers as they are.
        assert_eq!(
            alternate_chapter_url("https://site.test/title-chapter-120/").as_deref(),
            Some("https://site.test/title-chapter-120/")
        );
        assert_eq!(alternate_chapter_url("https://site.test/chapter/"), None);
    }

    #[test]
    fn test_extract_chapter_images() {
        let list = ImageAllowList::new(["cdn-kj.gmbr.pro/storage/drive", "uqni.net"]);
        let pattern = chapter_image_pattern(&list).unwrap();
        let html = r#"
            <div id="readerarea">
              <img src="https://cdn-kj.gmbr.pro/storage/drive/a/001.jpg" />
              <img src='https://cdn-kj.gmbr.pro/storage/drive/a/002.jpg'>
              <img src="https://example.com/storage/drive/a/003.jpg">
            </div>
            <script>var x = "https://cdn-kj.gmbr.pro/storage/drive/a/001.jpg";
            var y = "http://uqni.net/images\/004.webp";</script>"#;

        let result = extract_chapter_images(html, &pattern);
        assert_eq!(
            result.images,
            vec![
                "https://cdn-kj.gmbr.pro/storage/drive/a/001.jpg",
                "https://cdn-kj.gmbr.pro/storage/drive/a/002.jpg",
                "http://uqni.net/images/004.webp",
            ]
        );
    }

    #[test]
    fn test_images_from_sources_filters_by_allow_list() {
        let list = ImageAllowList::default();
        let input = r#"{"sources":[
            {"images":["https://cdn-kj.gmbr.pro/storage/drive/x.jpg","https://evil.test/y.jpg"]},
            {"images":["https://cdn-kj.gmbr.pro/storage/drive/y.jpg","https://cdn-kj.gmbr.pro/storage/drive/x.jpg"]}
        ]}"#;

        let result = images_from_sources(input, &list).unwrap();
        assert_eq!(
            result.images,
            vec![
                "https://cdn-kj.gmbr.pro/storage/drive/x.jpg",
                "https://cdn-kj.gmbr.pro/storage/drive/y.jpg",
            ]
        );
    }

    #[test]
    fn test_images_from_sources_malformed() {
        let list = ImageAllowList::default();
        assert!(matches!(
            images_from_sources("{nope", &list),
            Err(ScraperError::ParseError(_))
        ));
        assert!(images_from_sources(r#"{"other":1}"#, &list).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_retries_without_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/title-chapter-01/"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/title-chapter-1/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("chapter one"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/title-chapter-01/", server.uri());
        let response = fetch_chapter_page(&client, &url).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.url().as_str().ends_with("/title-chapter-1/"));
        assert_eq!(response.text().await.unwrap(), "chapter one");
    }

    #[tokio::test]
    async fn test_fetch_retries_with_zero_and_returns_second_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/title-chapter-1/"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/title-chapter-01/"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/title-chapter-1/", server.uri());
        let response = fetch_chapter_page(&client, &url).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.url().as_str().ends_with("/title-chapter-01/"));
    }

    #[tokio::test]
    async fn test_fetch_passes_through_other_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/title-chapter-01/"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/title-chapter-01/", server.uri());
        let response = fetch_chapter_page(&client, &url).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
