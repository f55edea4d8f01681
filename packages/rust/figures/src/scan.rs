//! HTML scan: apply the ordered matchers, resolve image URLs, find captions.

use paperscout_shared::Figure;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::matcher::ImageMatcher;

/// Captions longer than this are treated as body text.
const MAX_CAPTION_CHARS: usize = 200;

/// Lowercase markers that make a following paragraph count as a caption.
const CAPTION_MARKERS: [&str; 3] = ["figure", "fig.", "caption"];

/// Scan a page for figure images.
///
/// Matchers run in order; within a matcher, images are taken in document
/// order. The first occurrence of each resolved URL wins. No cap is applied.
pub fn scan_page(html: &str, page_url: &Url) -> Vec<Figure> {
    let doc = Html::parse_document(html);
    let mut figures: Vec<Figure> = Vec::new();

    for matcher in ImageMatcher::ORDERED {
        let selector = match Selector::parse(matcher.css()) {
            Ok(s) => s,
            Err(e) => {
                warn!(matcher = matcher.name(), error = ?e, "invalid matcher selector");
                continue;
            }
        };

        for img in doc.select(&selector) {
            let Some(src) = img.value().attr("src").filter(|s| !s.is_empty()) else {
                continue;
            };
            let Some(url) = resolve_image_url(src, page_url) else {
                debug!(%src, "unresolvable image source");
                continue;
            };
            if figures.iter().any(|f| f.url == url) {
                continue;
            }

            let alt = img
                .value()
                .attr("alt")
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string);

            figures.push(Figure {
                caption: find_caption(&doc, img),
                url,
                alt,
            });
        }
    }

    figures
}

/// Make an image source absolute. Protocol-relative sources get `https:`;
/// everything else resolves against the page URL.
pub fn resolve_image_url(src: &str, page_url: &Url) -> Option<String> {
    let src = src.trim();
    if src.starts_with("//") {
        return Url::parse(&format!("https:{src}")).ok().map(String::from);
    }
    page_url.join(src).ok().map(String::from)
}

/// Caption for an image: a `<figcaption>` inside the image's parent, else the
/// next `<p>` in document order when it is short and mentions a figure.
pub fn find_caption(doc: &Html, img: ElementRef<'_>) -> String {
    let Some(parent) = img.parent().and_then(ElementRef::wrap) else {
        return String::new();
    };

    let figcaption = parent
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "figcaption");
    if let Some(caption) = figcaption {
        let text = caption.text().collect::<String>().trim().to_string();
        if !text.is_empty() {
            return text;
        }
    }

    let next_p = doc
        .tree
        .root()
        .descendants()
        .skip_while(|node| node.id() != img.id())
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "p");

    if let Some(p) = next_p {
        let raw = p.text().collect::<String>();
        if raw.chars().count() < MAX_CAPTION_CHARS {
            let text = raw.trim();
            let lower = text.to_lowercase();
            if CAPTION_MARKERS.iter().any(|m| lower.contains(m)) {
                return text.to_string();
            }
        }
    }

    String::new()
}
