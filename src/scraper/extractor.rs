use std::sync::{Arc, LazyLock};

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::fetcher::Fetcher;
use crate::scraper::ScraperConfig;

/// Link text or href fragments that point at a menu page.
pub const MENU_LINK_KEYWORDS: &[&str] = &[
    "menu",
    "order",
    "food",
    "our-menu",
    "ourmenu",
    "online-order",
];

/// Class/id fragments that mark an element as likely menu content.
const CONTENT_SIGNALS: &[&str] = &["menu", "food", "dish", "item"];

/// Elements whose text never counts as content.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "iframe", "svg"];

/// Elements that end a line when flattened to text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Sections shorter than this are navigation or footer noise.
const MIN_SECTION_CHARS: usize = 50;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));
static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));
static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").expect("valid selector"));
static INLINE_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("valid regex"));
static LINE_EDGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ?\n ?").expect("valid regex"));
static BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Turns restaurant web pages into bounded plain text for the structuring step.
#[derive(Clone)]
pub struct HtmlTextExtractor {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    max_text_length: usize,
    min_text_length: usize,
}

impl HtmlTextExtractor {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>, config: &ScraperConfig) -> Self {
        Self {
            fetcher,
            max_text_length: config.max_text_length,
            min_text_length: config.min_text_length,
        }
    }

    /// Fetch `url` and extract its menu text. Fetch failures yield `None`.
    pub async fn extract_from_url(&self, url: &str) -> Option<String> {
        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::debug!(url, error = %e, "Page fetch failed");
                return None;
            }
        };
        Some(self.extract(&page.body, &page.final_url).await)
    }

    /// Extract menu text from `html`, following a menu link when one exists.
    ///
    /// A failed menu-page fetch falls back to the original page.
    pub async fn extract(&self, html: &str, base_url: &str) -> String {
        let menu_link = Url::parse(base_url)
            .ok()
            .and_then(|base| find_menu_link(html, &base).filter(|link| !same_page(link, &base)));

        if let Some(link) = menu_link {
            match self.fetcher.fetch(link.as_str()).await {
                Ok(page) => {
                    tracing::debug!(menu_url = %link, "Following menu link");
                    return self.extract_text(&page.body);
                }
                Err(e) => {
                    tracing::debug!(menu_url = %link, error = %e, "Menu link fetch failed, using original page");
                }
            }
        }

        self.extract_text(html)
    }

    /// Extract text from a document without following links.
    pub fn extract_text(&self, html: &str) -> String {
        extract_text(html, self.max_text_length, self.min_text_length)
    }
}

/// Find the first anchor whose text or href looks like a menu link.
pub fn find_menu_link(html: &str, base: &Url) -> Option<Url> {
    let document = Html::parse_document(html);

    document.select(&ANCHOR_SELECTOR).find_map(|anchor| {
        let href = anchor.value().attr("href")?.trim();
        if href.is_empty() || href.starts_with('#') || is_non_page_scheme(href) {
            return None;
        }

        let text = anchor.text().collect::<String>().to_lowercase();
        let href_lower = href.to_lowercase();
        let matches = MENU_LINK_KEYWORDS
            .iter()
            .any(|keyword| text.contains(keyword) || href_lower.contains(keyword));

        if matches {
            resolve_href(base, href)
        } else {
            None
        }
    })
}

/// Resolve an absolute, origin-relative, or relative href against `base`.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    base.join(href.trim()).ok()
}

fn is_non_page_scheme(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    ["mailto:", "tel:", "javascript:", "sms:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

fn same_page(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

/// Extract menu-signal text from `html`, falling back to the whole body.
pub fn extract_text(html: &str, max_chars: usize, min_chars: usize) -> String {
    let document = Html::parse_document(html);

    let mut sections = Vec::new();
    collect_sections(document.root_element(), &mut sections);

    let menu_text = sections
        .into_iter()
        .map(|section| normalize_whitespace(&element_text(section)))
        .filter(|text| text.chars().count() >= MIN_SECTION_CHARS)
        .collect::<Vec<_>>()
        .join("\n\n");

    let text = if menu_text.chars().count() < min_chars {
        let body = document
            .select(&BODY_SELECTOR)
            .next()
            .unwrap_or_else(|| document.root_element());
        normalize_whitespace(&element_text(body))
    } else {
        normalize_whitespace(&menu_text)
    };

    truncate_chars(&text, max_chars)
}

/// Image URLs inside menu-signal sections, resolved against `base`.
pub fn menu_images(html: &str, base: &Url, limit: usize) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut sections = Vec::new();
    collect_sections(document.root_element(), &mut sections);

    let mut images: Vec<String> = Vec::new();
    for section in sections {
        for img in section.select(&IMG_SELECTOR) {
            let Some(url) = img
                .value()
                .attr("src")
                .filter(|src| !src.starts_with("data:"))
                .and_then(|src| resolve_href(base, src))
            else {
                continue;
            };
            let url = url.to_string();
            if !images.contains(&url) {
                images.push(url);
            }
            if images.len() >= limit {
                return images;
            }
        }
    }
    images
}

/// Outermost elements that carry a menu signal.
fn collect_sections<'a>(element: ElementRef<'a>, out: &mut Vec<ElementRef<'a>>) {
    if SKIPPED_TAGS.contains(&element.value().name()) {
        return;
    }
    if is_content_signal(element) {
        out.push(element);
        return;
    }
    for child in element.children().filter_map(ElementRef::wrap) {
        collect_sections(child, out);
    }
}

fn is_content_signal(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if matches!(value.name(), "main" | "article") {
        return true;
    }
    let markers = [value.attr("class"), value.attr("id")]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    CONTENT_SIGNALS.iter().any(|signal| markers.contains(signal))
}

fn element_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_text(element, &mut out);
    out
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SKIPPED_TAGS.contains(&name) {
        return;
    }
    let is_block = BLOCK_TAGS.contains(&name);
    if is_block && !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            push_text(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
    if is_block {
        out.push('\n');
    }
}

/// Collapse space/tab runs, collapse blank-line runs to one, and trim.
pub fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = INLINE_SPACE_RE.replace_all(&text, " ");
    let text = LINE_EDGE_RE.replace_all(&text, "\n");
    let text = BLANK_LINES_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}
