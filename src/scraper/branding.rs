//! Best-effort logo and brand color discovery.
//!
//! Logo candidates are ranked so that images explicitly marked as a logo win
//! over touch icons, favicons and open-graph share images. Colors come from
//! document metadata on the static path and from computed styles of
//! prominent elements when the page was rendered in a browser.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::domain::BrandColors;
use crate::scraper::extractor::resolve_href;

static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid selector"));
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("link[rel][href]").expect("valid selector"));
static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[content]").expect("valid selector"));
static MASK_ICON_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("link[rel=\"mask-icon\"][color]").expect("valid selector"));

/// Samples computed colors from the header, the first prominent button and
/// the first link, in that order.
pub const COLOR_SAMPLING_SCRIPT: &str = r#"
(() => {
    const pick = (selectors, prop) => {
        for (const selector of selectors) {
            const el = document.querySelector(selector);
            if (!el) continue;
            const value = getComputedStyle(el)[prop];
            if (value) return value;
        }
        return null;
    };
    return [
        pick(['header', '[class*="header"]', 'nav'], 'backgroundColor'),
        pick(['.btn-primary', 'button[class*="primary"]', 'a[class*="button"]', 'button', '.btn'], 'backgroundColor'),
        pick(['main a', 'a'], 'color'),
    ].filter(Boolean);
})()
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum LogoSource {
    OgImage,
    Icon,
    TouchIcon,
    OgLogo,
    ImgLogo,
    HeaderImgLogo,
}

#[derive(Debug, Clone)]
struct LogoCandidate {
    url: String,
    source: LogoSource,
}

/// Pick the most logo-like image URL in `html`.
pub fn find_logo(html: &str, base: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    let mut candidates = Vec::new();

    for img in document.select(&IMG_SELECTOR) {
        let value = img.value();
        let marker = [value.attr("class"), value.attr("id"), value.attr("alt")]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let parent_marker = img
            .parent()
            .and_then(ElementRef::wrap)
            .map(|p| {
                [p.value().attr("class"), p.value().attr("id")]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase()
            })
            .unwrap_or_default();
        if !marker.contains("logo") && !parent_marker.contains("logo") {
            continue;
        }

        let Some(src) = value
            .attr("src")
            .or_else(|| value.attr("data-src"))
            .filter(|src| !src.starts_with("data:"))
            .and_then(|src| resolve_href(base, src))
        else {
            continue;
        };

        let source = if in_header(img) {
            LogoSource::HeaderImgLogo
        } else {
            LogoSource::ImgLogo
        };
        candidates.push(LogoCandidate {
            url: src.to_string(),
            source,
        });
    }

    for link in document.select(&LINK_SELECTOR) {
        let rel = link.value().attr("rel").unwrap_or_default().to_lowercase();
        let source = if rel.contains("apple-touch-icon") {
            LogoSource::TouchIcon
        } else if rel.split_whitespace().any(|r| r == "icon") {
            LogoSource::Icon
        } else {
            continue;
        };
        if let Some(href) = link.value().attr("href").and_then(|h| resolve_href(base, h)) {
            candidates.push(LogoCandidate {
                url: href.to_string(),
                source,
            });
        }
    }

    for meta in document.select(&META_SELECTOR) {
        let key = meta
            .value()
            .attr("property")
            .or_else(|| meta.value().attr("name"))
            .unwrap_or_default()
            .to_lowercase();
        let source = match key.as_str() {
            "og:logo" => LogoSource::OgLogo,
            "og:image" => LogoSource::OgImage,
            _ => continue,
        };
        if let Some(url) = meta
            .value()
            .attr("content")
            .and_then(|c| resolve_href(base, c))
        {
            candidates.push(LogoCandidate {
                url: url.to_string(),
                source,
            });
        }
    }

    // Stable sort keeps document order among equally ranked candidates.
    candidates.sort_by(|a, b| b.source.cmp(&a.source));
    candidates.into_iter().next().map(|c| c.url)
}

fn in_header(element: ElementRef<'_>) -> bool {
    element.ancestors().filter_map(ElementRef::wrap).any(|a| {
        let value = a.value();
        value.name() == "header"
            || value
                .attr("class")
                .is_some_and(|c| c.to_lowercase().contains("header"))
            || value.attr("id").is_some_and(|i| i.to_lowercase().contains("header"))
    })
}

/// Brand colors declared in document metadata.
pub fn find_meta_colors(html: &str) -> Option<BrandColors> {
    let document = Html::parse_document(html);
    let mut samples: Vec<String> = Vec::new();

    for meta in document.select(&META_SELECTOR) {
        let name = meta.value().attr("name").unwrap_or_default().to_lowercase();
        if name == "theme-color" || name == "msapplication-tilecolor" {
            if let Some(content) = meta.value().attr("content") {
                samples.push(content.to_string());
            }
        }
    }

    for link in document.select(&MASK_ICON_SELECTOR) {
        if let Some(color) = link.value().attr("color") {
            samples.push(color.to_string());
        }
    }

    BrandColors::from_samples(&samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://acme-diner.com/").unwrap()
    }

    #[test]
    fn test_header_logo_wins() {
        let html = r#"<html><head>
            <link rel="icon" href="/favicon.ico">
            <meta property="og:image" content="https://cdn.acme-diner.com/share.jpg">
            </head><body>
            <footer><img class="footer-logo" src="/footer-logo.png"></footer>
            <header><a class="site-logo"><img src="/brand.svg" alt="Acme"></a></header>
            </body></html>"#;
        assert_eq!(
            find_logo(html, &base()).as_deref(),
            Some("https://acme-diner.com/brand.svg")
        );
    }

    #[test]
    fn test_icon_beats_og_image() {
        let html = r#"<head>
            <meta property="og:image" content="/share.jpg">
            <link rel="shortcut icon" href="/favicon.png">
            </head>"#;
        assert_eq!(
            find_logo(html, &base()).as_deref(),
            Some("https://acme-diner.com/favicon.png")
        );
    }

    #[test]
    fn test_touch_icon_beats_favicon() {
        let html = r#"<head>
            <link rel="icon" href="/favicon.ico">
            <link rel="apple-touch-icon" href="/touch.png">
            </head>"#;
        assert_eq!(
            find_logo(html, &base()).as_deref(),
            Some("https://acme-diner.com/touch.png")
        );
    }

    #[test]
    fn test_no_logo() {
        assert!(find_logo("<body><img src=\"/dish.jpg\"></body>", &base()).is_none());
    }

    #[test]
    fn test_meta_colors() {
        let html = r##"<head>
            <meta name="theme-color" content="#B22222">
            <meta name="msapplication-TileColor" content="#ffffff">
            <link rel="mask-icon" href="/mask.svg" color="#225588">
            </head>"##;
        let colors = find_meta_colors(html).unwrap();
        assert_eq!(colors.primary, "#b22222");
        assert_eq!(colors.secondary, "#225588");
        assert_eq!(colors.accent, "#225588");
    }

    #[test]
    fn test_meta_colors_absent() {
        assert!(find_meta_colors("<head><title>Diner</title></head>").is_none());
    }

    #[test]
    fn test_color_script_samples_three_regions() {
        assert!(COLOR_SAMPLING_SCRIPT.contains("backgroundColor"));
        assert!(COLOR_SAMPLING_SCRIPT.contains("'header'"));
        assert!(COLOR_SAMPLING_SCRIPT.contains("'color'"));
    }
}
