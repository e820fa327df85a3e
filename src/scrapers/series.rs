//! Series listing, detail and search page extraction.
//!
//! Selectors target the MangaReader WordPress theme used by the source site.

use super::thumbnail::resolve_thumbnail;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

/// Upper bound reported for `totalPages`.
pub const MAX_TOTAL_PAGES: u32 = 100;

/// Digit runs long enough to carry a thousands group (`12345` -> `12-345`).
static DIGIT_GROUP_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)(\d{3})").unwrap());

/// Pagination label such as `Page 1 of 37`.
static TOTAL_PAGES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)of\s+(\d+)").unwrap());

/// CSS selectors used for parsing.
struct Selectors {
    /// Listing and search cards.
    card: Selector,
    card_title: Selector,
    card_link: Selector,
    card_latest: Selector,
    card_status: Selector,
    card_image: Selector,
    /// Pagination label on listing pages.
    pagination: Selector,
    /// Series page title.
    detail_title: Selector,
    /// Series synopsis paragraphs.
    detail_description: Selector,
    /// Chapter list entries.
    chapter_item: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    card: Selector::parse(".listupd .bs").unwrap(),
    card_title: Selector::parse(".tt").unwrap(),
    card_link: Selector::parse("a").unwrap(),
    card_latest: Selector::parse(".epxs").unwrap(),
    card_status: Selector::parse(".status").unwrap(),
    card_image: Selector::parse("img").unwrap(),
    pagination: Selector::parse(".hpage .r").unwrap(),
    detail_title: Selector::parse(".infox h1").unwrap(),
    detail_description: Selector::parse(".entry-content p").unwrap(),
    chapter_item: Selector::parse(".bxcl ul li").unwrap(),
});

/// Filters for a series listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesQuery {
    /// Series type, e.g. `manhwa`.
    pub kind: String,
    pub page: u32,
    pub limit: usize,
    pub status: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
}

impl SeriesQuery {
    /// Creates a query for the first page with the default limit.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            page: 1,
            limit: 20,
            ..Self::default()
        }
    }

    /// Builds the listing URL under `base`.
    ///
    /// `status=all` and `order=default` are treated as unset.
    pub fn listing_url(&self, base: &Url) -> Result<Url, url::ParseError> {
        let mut url = base.join("manga/")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("type", &self.kind);
            pairs.append_pair("page", &self.page.to_string());
            if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty() && *s != "all") {
                pairs.append_pair("status", status);
            }
            if let Some(order) = self
                .order
                .as_deref()
                .filter(|o| !o.is_empty() && *o != "default")
            {
                pairs.append_pair("order", order);
            }
            if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
                pairs.append_pair("s", search);
            }
        }
        Ok(url)
    }
}

/// A series card as shown on the listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesCard {
    pub title: String,
    /// First chapter of the series.
    pub url: String,
    pub thumbnail: Option<String>,
    #[serde(rename = "chapter", alias = "latestChapter")]
    pub latest_chapter: String,
    /// Placeholder value, see [`placeholder_rating`].
    pub rating: f64,
    pub status: String,
}

/// A listing card before its thumbnail has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesListing {
    pub title: String,
    /// The series page the card links to.
    pub series_url: Option<String>,
    /// Derived first-chapter URL.
    pub chapter_url: Option<String>,
    pub latest_chapter: String,
    pub status: String,
}

/// One page of series cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPage {
    pub series: Vec<SeriesCard>,
    pub current_page: u32,
    pub total_pages: u32,
}

/// A chapter entry on a series page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterLink {
    pub url: String,
    pub title: String,
}

/// Full metadata for one series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesDetail {
    pub title: String,
    pub thumbnail: Option<String>,
    pub description: String,
    /// Chapters in page order, newest first.
    pub chapters: Vec<ChapterLink>,
}

impl SeriesDetail {
    /// The first chapter of the series (last in page order).
    pub fn first_chapter(&self) -> Option<&ChapterLink> {
        self.chapters.last()
    }

    /// The most recent chapter (first in page order).
    pub fn latest_chapter(&self) -> Option<&ChapterLink> {
        self.chapters.first()
    }
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub latest_chapter: String,
}

fn text_of(el: ElementRef, selector: &Selector) -> String {
    el.select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn attr_of(el: ElementRef, selector: &Selector, attr: &str) -> Option<String> {
    el.select(selector)
        .next()
        .and_then(|e| e.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolves `href` against `base`, leaving absolute URLs as they are.
fn resolve_href(base: &Url, href: &str) -> Option<String> {
    match base.join(href) {
        Ok(url) => Some(url.to_string()),
        Err(err) => {
            tracing::debug!(href, %err, "unresolvable link skipped");
            None
        }
    }
}

/// Derives the first-chapter URL of a series from its page URL.
///
/// `https://site/manga/solo-leveling/` becomes
/// `https://site/solo-leveling-chapter-01/`. Digit runs of four or more get a
/// hyphen before their last three digits, matching the site's chapter slugs.
pub fn chapter_url_for_series(series_url: &str) -> Option<String> {
    let parsed = Url::parse(series_url).ok()?;
    let path = parsed.path().trim_start_matches('/').replacen("manga/", "", 1);
    let path = path.strip_suffix('/').unwrap_or(&path);
    if path.is_empty() {
        return None;
    }

    let slug = DIGIT_GROUP_REGEX.replace_all(path, "$1-$2");
    Some(format!(
        "{}/{}-chapter-01/",
        parsed.origin().ascii_serialization(),
        slug
    ))
}

/// Placeholder rating for series cards.
///
/// The source site exposes no rating, so this is a uniform sample in
/// `[3.5, 5.0]` rounded to one decimal. It is decorative and not reproducible.
pub fn placeholder_rating() -> f64 {
    let raw = 3.5 + fastrand::f64() * 1.5;
    ((raw * 10.0).round() / 10.0).clamp(3.5, 5.0)
}

/// Cards and page count read from one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub listings: Vec<SeriesListing>,
    pub total_pages: u32,
}

/// Extracts up to `limit` cards and the total page count from a listing page.
pub fn extract_listing_page(html: &str, base: &Url, limit: usize) -> ListingPage {
    let doc = Html::parse_document(html);

    ListingPage {
        listings: listings_in(&doc, base, limit),
        total_pages: total_pages_in(&doc),
    }
}

fn listings_in(doc: &Html, base: &Url, limit: usize) -> Vec<SeriesListing> {
    doc.select(&SELECTORS.card)
        .take(limit)
        .map(|card| {
            let series_url = card
                .select(&SELECTORS.card_link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolve_href(base, href));
            let chapter_url = series_url.as_deref().and_then(chapter_url_for_series);

            SeriesListing {
                title: text_of(card, &SELECTORS.card_title),
                series_url,
                chapter_url,
                latest_chapter: text_of(card, &SELECTORS.card_latest),
                status: text_of(card, &SELECTORS.card_status),
            }
        })
        .collect()
}

/// Reads the `Page x of N` label, capped at [`MAX_TOTAL_PAGES`].
fn total_pages_in(doc: &Html) -> u32 {
    let label = doc
        .select(&SELECTORS.pagination)
        .next()
        .map(|e| e.text().collect::<String>())
        .unwrap_or_default();

    TOTAL_PAGES_REGEX
        .captures(&label)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_TOTAL_PAGES)
}

/// Pairs listings with their thumbnails and drops incomplete cards.
///
/// `thumbnails` must be in listing order. Cards without a title, chapter URL
/// or thumbnail are left out.
pub fn assemble_cards(
    listings: Vec<SeriesListing>,
    thumbnails: Vec<Option<String>>,
) -> Vec<SeriesCard> {
    listings
        .into_iter()
        .zip(thumbnails)
        .filter_map(|(listing, thumbnail)| {
            let url = listing.chapter_url.filter(|u| !u.is_empty())?;
            let thumbnail = thumbnail.filter(|t| !t.is_empty())?;
            if listing.title.is_empty() {
                return None;
            }

            Some(SeriesCard {
                title: listing.title,
                url,
                thumbnail: Some(thumbnail),
                latest_chapter: listing.latest_chapter,
                rating: placeholder_rating(),
                status: listing.status,
            })
        })
        .collect()
}

/// Extracts title, description, chapters and thumbnail from a series page.
pub fn extract_series_detail(html: &str) -> SeriesDetail {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let chapters = doc
        .select(&SELECTORS.chapter_item)
        .filter_map(|item| {
            let url = attr_of(item, &SELECTORS.card_link, "href")?;
            Some(ChapterLink {
                url,
                title: text_of(item, &SELECTORS.card_link),
            })
        })
        .collect();

    SeriesDetail {
        title: text_of(root, &SELECTORS.detail_title),
        thumbnail: resolve_thumbnail(html),
        description: text_of(root, &SELECTORS.detail_description),
        chapters,
    }
}

/// Extracts search hits from a search results page.
pub fn extract_search_results(html: &str, base: &Url) -> Vec<SearchResult> {
    let doc = Html::parse_document(html);

    doc.select(&SELECTORS.card)
        .map(|card| SearchResult {
            title: text_of(card, &SELECTORS.card_title),
            url: card
                .select(&SELECTORS.card_link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolve_href(base, href)),
            thumbnail: attr_of(card, &SELECTORS.card_image, "src"),
            latest_chapter: text_of(card, &SELECTORS.card_latest),
        })
        .collect()
}
