//! Image URL extraction from chapter pages.
//!
//! Two passes recover page images: one reads the JSON payload handed to the
//! theme's `ts_reader.run(...)` call, the other walks `<img>` tags. Both keep
//! only the first image seen per hostname and derive a card URL from it.

use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::LazyLock;
use url::Url;

/// File extensions accepted as page images.
static VALID_IMAGE_EXTENSIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(jpeg|png|jpg|webp)$").unwrap());

/// Reader initialization call carrying the chapter's image sources.
static READER_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)ts_reader\.run\s*\(\s*(.*?)\s*\);").unwrap());

static IMG_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

/// Image links found on a page, with their hosts and card URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedImageSet {
    /// Image URLs in first-seen order.
    pub links: Vec<String>,
    /// Hostnames of `links`, in first-seen order.
    pub domains: Vec<String>,
    /// Card URLs derived from `links`.
    pub card_urls: Vec<String>,
}

impl ScrapedImageSet {
    /// Returns true if no image was found.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Records `image` unless its host has already contributed an image.
    fn push_first_per_host(&mut self, image: &str) {
        let host = match Url::parse(image) {
            Ok(parsed) => match parsed.host_str() {
                Some(host) => host.to_string(),
                None => {
                    tracing::warn!(image, "image URL has no host, skipping");
                    return;
                }
            },
            Err(err) => {
                tracing::warn!(image, %err, "invalid image URL, skipping");
                return;
            }
        };

        if self.domains.contains(&host) {
            return;
        }

        self.domains.push(host);
        push_unique(&mut self.links, image.to_string());
        if let Some(card) = card_url(image) {
            push_unique(&mut self.card_urls, card);
        }
    }

    /// Appends another set, keeping every collection free of duplicates.
    pub fn merge(&mut self, other: ScrapedImageSet) {
        for link in other.links {
            push_unique(&mut self.links, link);
        }
        for domain in other.domains {
            push_unique(&mut self.domains, domain);
        }
        for card in other.card_urls {
            push_unique(&mut self.card_urls, card);
        }
    }
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// Returns true if the URL ends in a page image extension.
pub fn has_image_extension(candidate: &str) -> bool {
    VALID_IMAGE_EXTENSIONS.is_match(candidate)
}

/// Derives the card URL of the gallery an image belongs to.
///
/// The card URL is the image URL's origin followed by its first four path
/// segments. Returns `None` for URLs with fewer segments or that fail to
/// parse.
pub fn card_url(image_url: &str) -> Option<String> {
    let parsed = match Url::parse(image_url) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::debug!(image_url, %err, "cannot derive card URL");
            return None;
        }
    };

    let segments: Vec<&str> = parsed.path().split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 4 {
        return None;
    }

    Some(format!(
        "{}/{}",
        parsed.origin().ascii_serialization(),
        segments[..4].join("/")
    ))
}

/// Walks a reader payload (`{"sources":[{"images":[...]}]}`) and returns its
/// image strings in order. Entries of the wrong shape are skipped.
pub(crate) fn reader_source_images(payload: &JsonValue) -> Vec<&str> {
    let Some(sources) = payload.get("sources").and_then(JsonValue::as_array) else {
        tracing::debug!("reader payload has no sources array");
        return Vec::new();
    };

    let mut images = Vec::new();
    for source in sources {
        let Some(entries) = source.get("images").and_then(JsonValue::as_array) else {
            tracing::debug!("reader source has no images array");
            continue;
        };

        for entry in entries {
            match entry.as_str() {
                Some(image) => images.push(image),
                None => tracing::debug!(?entry, "non-string reader image skipped"),
            }
        }
    }

    images
}

/// Extracts images from the `ts_reader.run(...)` payload embedded in `raw_text`.
///
/// Only the file extension gates an image here; the host allow-list is not
/// consulted. A missing call or malformed payload yields an empty set.
pub fn extract_from_embedded_reader(raw_text: &str) -> ScrapedImageSet {
    let mut set = ScrapedImageSet::default();

    let Some(payload) = READER_RUN_REGEX
        .captures(raw_text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    else {
        return set;
    };

    let data: JsonValue = match serde_json::from_str(payload) {
        Ok(data) => data,
        Err(err) => {
            let preview: String = payload.chars().take(200).collect();
            tracing::error!(%err, payload = %preview, "failed to parse ts_reader.run payload");
            return set;
        }
    };

    for image in reader_source_images(&data) {
        if has_image_extension(image) {
            set.push_first_per_host(image);
        }
    }

    set
}

/// Extracts images from the `src` attribute of every `<img>` in `html`.
pub fn extract_from_img_tags(html: &str) -> ScrapedImageSet {
    let doc = Html::parse_document(html);
    let mut set = ScrapedImageSet::default();

    for img in doc.select(&IMG_SELECTOR) {
        if let Some(src) = img.value().attr("src")
            && has_image_extension(src)
        {
            set.push_first_per_host(src);
        }
    }

    set
}
