//! Representative image lookup for series pages.

use scraper::{Html, Selector};
use serde_json::Value as JsonValue;
use std::sync::LazyLock;

/// CSS selectors used for thumbnail lookup.
struct Selectors {
    meta: Selector,
    json_ld: Selector,
    thumb_img: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    meta: Selector::parse("meta[property]").unwrap(),
    json_ld: Selector::parse(r#"script[type="application/ld+json"]"#).unwrap(),
    thumb_img: Selector::parse(".thumb img").unwrap(),
});

/// Meta `property` values that carry the page image.
const META_PROPERTIES: &[&str] = &["og:image", "primaryImageOfPage"];

/// Resolves a representative image for a page.
///
/// Tries meta tags, then JSON-LD blocks, then the theme's `.thumb img`.
pub fn resolve_thumbnail(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);

    from_meta(&doc)
        .or_else(|| from_json_ld(&doc))
        .or_else(|| from_thumb_container(&doc))
}

fn from_meta(doc: &Html) -> Option<String> {
    doc.select(&SELECTORS.meta)
        .filter(|meta| {
            meta.value()
                .attr("property")
                .is_some_and(|p| META_PROPERTIES.contains(&p))
        })
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

fn from_json_ld(doc: &Html) -> Option<String> {
    for block in doc.select(&SELECTORS.json_ld) {
        let text = block.text().collect::<String>();
        let data: JsonValue = match serde_json::from_str(text.trim()) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(%err, "skipping unparseable JSON-LD block");
                continue;
            }
        };

        if let Some(url) = primary_image(&data) {
            return Some(url);
        }
    }

    None
}

/// Reads `primaryImageOfPage` from a JSON-LD node or any node of its `@graph`.
fn primary_image(data: &JsonValue) -> Option<String> {
    if let Some(url) = data.get("primaryImageOfPage").and_then(image_url) {
        return Some(url);
    }

    data.get("@graph")
        .and_then(JsonValue::as_array)?
        .iter()
        .find_map(|node| node.get("primaryImageOfPage").and_then(image_url))
}

/// Accepts either a bare URL string or an `ImageObject` with `contentUrl`.
fn image_url(value: &JsonValue) -> Option<String> {
    let url = match value {
        JsonValue::String(s) => s.as_str(),
        JsonValue::Object(obj) => obj.get("contentUrl").and_then(JsonValue::as_str)?,
        _ => return None,
    };

    let url = url.trim();
    (!url.is_empty()).then(|| url.to_string())
}

fn from_thumb_container(doc: &Html) -> Option<String> {
    doc.select(&SELECTORS.thumb_img)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| src.trim().to_string())
        .filter(|src| !src.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_og_image_wins() {
        let html = r#"<html><head>
            <meta property="og:title" content="Solo Leveling">
            <meta property="og:image" content="https://site.test/og.jpg">
            <script type="application/ld+json">{"primaryImageOfPage":"https://site.test/ld.jpg"}</script>
            </head><body><div class="thumb"><img src="https://site.test/thumb.jpg"></div></body></html>"#;

        assert_eq!(
            resolve_thumbnail(html).as_deref(),
            Some("https://site.test/og.jpg")
        );
    }

    #[test]
    fn test_meta_primary_image_property() {
        let html = r#"<meta property="primaryImageOfPage" content="https://site.test/p.webp">"#;
        assert_eq!(
            resolve_thumbnail(html).as_deref(),
            Some("https://site.test/p.webp")
        );
    }

    #[test]
    fn test_json_ld_content_url_and_bad_block() {
        let html = r#"<html><head>
            <script type="application/ld+json">{ this is not json </script>
            <script type="application/ld+json">{"@type":"WebPage"}</script>
            <script type="application/ld+json">{"primaryImageOfPage":{"@id":"x","contentUrl":"https://site.test/ld.jpg"}}</script>
            </head></html>"#;

        assert_eq!(
            resolve_thumbnail(html).as_deref(),
            Some("https://site.test/ld.jpg")
        );
    }

    #[test]
    fn test_json_ld_graph() {
        let html = r#"<script type="application/ld+json">
            {"@context":"https://schema.org","@graph":[
              {"@type":"Organization","name":"Site"},
              {"@type":"WebPage","primaryImageOfPage":"https://site.test/graph.png"}
            ]}</script>"#;

        assert_eq!(
            resolve_thumbnail(html).as_deref(),
            Some("https://site.test/graph.png")
        );
    }

    #[test]
    fn test_thumb_fallback() {
        let html = r#"<div class="bigcontent"><div class="thumb">
            <img src="https://site.test/wp-content/uploads/cover.jpg" alt="cover">
            </div></div>"#;

        assert_eq!(
            resolve_thumbnail(html).as_deref(),
            Some("https://site.test/wp-content/uploads/cover.jpg")
        );
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(resolve_thumbnail("<html><body><p>hi</p></body></html>"), None);
        assert_eq!(
            resolve_thumbnail(r#"<meta property="og:image" content="  ">"#),
            None
        );
    }
}
