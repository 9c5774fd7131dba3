//! Menu extraction from a place's map listing page.
//!
//! The listing is driven like a user would: find an outbound menu link,
//! open the "Menu" tab, walk each sub-tab (Lunch, Dinner, ...) and scroll
//! the panel until lazy content stops loading. Every in-page query goes
//! through the shadow-DOM helpers since most of the listing lives inside
//! web components.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::app::{MenuError, Result};
use crate::domain::ScrapeResult;
use crate::scraper::extractor::normalize_whitespace;
use crate::scraper::page::{evaluate_as, PageDriver, PageLauncher};
use crate::scraper::shadow::{js_string, with_deep_query};
use crate::scraper::{Scraper, ScraperConfig};

const MAP_PLACE_URL: &str = "https://www.google.com/maps/place/";

/// Hosts that belong to the map provider itself and never count as an
/// outbound menu link.
const MAP_HOST_MARKERS: &[&str] = &["google.", "goo.gl", "gstatic.com", "googleusercontent.com"];

/// Shared in-page helpers locating the menu panel and its scroll container.
const PANEL_HELPERS: &str = r#"
const menuPanel = () => {
    const panel = deepQuery('[role="tabpanel"]');
    if (panel) return panel;
    const lists = deepQueryAll('[role="tablist"]');
    const last = lists[lists.length - 1];
    return last ? last.parentElement : document.body;
};
const scrollContainer = (el) => {
    let node = el;
    while (node && node !== document.body) {
        const style = getComputedStyle(node);
        if ((style.overflowY === 'auto' || style.overflowY === 'scroll') && node.scrollHeight > node.clientHeight) {
            return node;
        }
        node = node.parentElement || (node.getRootNode && node.getRootNode().host) || null;
    }
    return document.scrollingElement || document.documentElement;
};
"#;

/// Words that mark an anchor as leading to a menu or to online ordering.
const MENU_LINK_WORDS: &[&str] = &["menu", "order"];

/// Anchors whose text or aria-label mentions a menu or ordering, in document
/// order. Fragments, script links and map-provider hosts are skipped in the
/// page; the caller still applies [`first_menu_link`].
fn outbound_link_script() -> String {
    let markers = MAP_HOST_MARKERS
        .iter()
        .map(|m| js_string(m))
        .collect::<Vec<_>>()
        .join(", ");
    let words = MENU_LINK_WORDS
        .iter()
        .map(|w| js_string(w))
        .collect::<Vec<_>>()
        .join(", ");

    with_deep_query(&format!(
        r#"
const providerHosts = [{markers}];
const linkWords = [{words}];
const menuLinkCandidates = () => {{
    const found = [];
    for (const a of deepQueryAll('a[href]')) {{
        const raw = a.getAttribute('href') || '';
        if (!raw || raw.startsWith('#') || raw.startsWith('javascript:')) continue;
        let host = '';
        try {{ host = new URL(a.href).hostname.toLowerCase(); }} catch (e) {{ continue; }}
        if (providerHosts.some((marker) => host.includes(marker))) continue;
        const label = [deepText(a), a.getAttribute('aria-label') || ''].join(' ');
        if (!linkWords.some((word) => label.toLowerCase().includes(word))) continue;
        found.push({{ href: a.href, raw, label }});
    }}
    return found;
}};
return menuLinkCandidates();
"#
    ))
}

/// One anchor reported by the in-page link scan.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct LinkCandidate {
    /// Resolved URL
    href: String,
    /// `href` attribute as written
    raw: String,
    /// Visible text and aria-label
    label: String,
}

/// First candidate that names a menu or ordering and leaves the map provider.
fn first_menu_link(candidates: &[LinkCandidate]) -> Option<String> {
    candidates
        .iter()
        .find(|c| {
            let raw = c.raw.trim();
            let label = c.label.to_lowercase();
            !raw.starts_with('#')
                && !raw.starts_with("javascript:")
                && MENU_LINK_WORDS.iter().any(|word| label.contains(word))
                && is_outbound_link(&c.href)
        })
        .map(|c| c.href.clone())
}

fn click_menu_tab_script() -> String {
    with_deep_query(
        r#"
const clickMenuTab = () => {
    const lists = deepQueryAll('[role="tablist"]');
    if (!lists.length) return false;
    const tabs = deepQueryAll('[role="tab"]', lists[0]);
    const label = (t) => (deepText(t) + ' ' + (t.getAttribute('aria-label') || '')).toLowerCase();
    const tab = tabs.find((t) => deepText(t).toLowerCase() === 'menu') || tabs.find((t) => label(t).includes('menu'));
    if (!tab) return false;
    tab.click();
    return true;
};
return clickMenuTab();
"#,
    )
}

fn sub_tab_labels_script() -> String {
    with_deep_query(
        r#"
const subTabLabels = () => {
    const lists = deepQueryAll('[role="tablist"]');
    if (lists.length < 2) return [];
    return deepQueryAll('[role="tab"]', lists[1]).map((t) => deepText(t) || t.getAttribute('aria-label') || '');
};
return subTabLabels();
"#,
    )
}

/// Tabs are re-queried by index each time since clicking re-renders the list.
fn click_sub_tab_script(index: usize) -> String {
    with_deep_query(&format!(
        r#"
const clickSubTab = (index) => {{
    const lists = deepQueryAll('[role="tablist"]');
    if (lists.length < 2) return false;
    const tab = deepQueryAll('[role="tab"]', lists[1])[index];
    if (!tab) return false;
    tab.click();
    return true;
}};
return clickSubTab({index});
"#
    ))
}

fn scroll_panel_script(step_px: u32) -> String {
    with_deep_query(&format!(
        r#"{PANEL_HELPERS}
const scrollPanel = (step) => {{
    const container = scrollContainer(menuPanel());
    container.scrollBy(0, step);
    return container.scrollTop;
}};
return scrollPanel({step_px});
"#
    ))
}

fn panel_text_script() -> String {
    with_deep_query(&format!(
        r#"{PANEL_HELPERS}
const panelText = () => deepText(menuPanel());
return panelText();
"#
    ))
}

fn panel_images_script(limit: usize) -> String {
    with_deep_query(&format!(
        r#"{PANEL_HELPERS}
const panelImages = (limit) => {{
    const urls = [];
    for (const img of deepQueryAll('img', menuPanel())) {{
        const src = img.currentSrc || img.src || '';
        if (!src.startsWith('http') || urls.includes(src)) continue;
        urls.push(src);
        if (urls.length >= limit) break;
    }}
    return urls;
}};
return panelImages({limit});
"#
    ))
}

/// Map listing URL for a place id.
pub fn place_url(place_id: &str) -> Result<String> {
    let url = Url::parse_with_params(MAP_PLACE_URL, &[("q", format!("place_id:{place_id}"))])?;
    Ok(url.to_string())
}

/// Whether `href` leaves the map provider.
pub fn is_outbound_link(href: &str) -> bool {
    let Ok(url) = Url::parse(href) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let host = url.host_str().unwrap_or_default().to_lowercase();
    !host.is_empty() && !MAP_HOST_MARKERS.iter().any(|marker| host.contains(marker))
}

/// Heading that introduces one sub-tab's text.
fn section_heading(label: &str) -> String {
    format!("=== {} ===", label.trim().to_uppercase())
}

/// Drives a map listing page to collect its menu panel.
pub struct MapsScraper {
    launcher: Arc<dyn PageLauncher>,
    config: ScraperConfig,
}

impl MapsScraper {
    pub fn new(launcher: Arc<dyn PageLauncher>, config: ScraperConfig) -> Self {
        Self { launcher, config }
    }

    async fn find_outbound_link(&self, page: &dyn PageDriver) -> Option<String> {
        match evaluate_as::<Vec<LinkCandidate>>(page, &outbound_link_script()).await {
            Ok(candidates) => first_menu_link(&candidates),
            Err(e) => {
                debug!(error = %e, "Outbound menu link lookup failed");
                None
            }
        }
    }

    /// Scroll the menu panel until its position stops changing.
    async fn scroll_to_end(&self, page: &dyn PageDriver) {
        let script = scroll_panel_script(self.config.scroll_step_px);
        let mut last: Option<f64> = None;
        let mut stable = 0;

        for attempt in 0..self.config.max_scroll_attempts {
            let position = match evaluate_as::<f64>(page, &script).await {
                Ok(position) => position,
                Err(e) => {
                    debug!(attempt, error = %e, "Panel scroll failed");
                    break;
                }
            };
            page.settle(self.config.scroll_interval()).await;

            if last == Some(position) {
                stable += 1;
                if stable >= 2 {
                    break;
                }
            } else {
                stable = 0;
            }
            last = Some(position);
        }
    }

    async fn panel_text(&self, page: &dyn PageDriver) -> String {
        self.scroll_to_end(page).await;
        match evaluate_as::<String>(page, &panel_text_script()).await {
            Ok(text) => normalize_whitespace(&text),
            Err(e) => {
                debug!(error = %e, "Panel text read failed");
                String::new()
            }
        }
    }

    async fn scrape_page(&self, page: &dyn PageDriver, place_id: &str) -> Result<Option<ScrapeResult>> {
        page.navigate(&place_url(place_id)?).await?;
        page.settle(self.config.map_wait_after_load()).await;

        let menu_url = self.find_outbound_link(page).await;
        if let Some(ref link) = menu_url {
            debug!(place_id, menu_url = %link, "Found outbound menu link");
        }

        let clicked = evaluate_as::<bool>(page, &click_menu_tab_script())
            .await
            .unwrap_or(false);
        if !clicked {
            debug!(place_id, "Listing has no menu tab");
            return Ok(menu_url.map(|link| ScrapeResult {
                menu_url: Some(link),
                ..Default::default()
            }));
        }
        page.settle(self.config.tab_settle()).await;

        let labels: Vec<String> = evaluate_as(page, &sub_tab_labels_script())
            .await
            .unwrap_or_default();

        let mut sections = Vec::new();
        if labels.is_empty() {
            let text = self.panel_text(page).await;
            if !text.is_empty() {
                sections.push(text);
            }
        } else {
            for (index, label) in labels.iter().enumerate() {
                match evaluate_as::<bool>(page, &click_sub_tab_script(index)).await {
                    Ok(true) => {}
                    Ok(false) => {
                        debug!(index, label = %label, "Sub-tab disappeared");
                        continue;
                    }
                    Err(e) => {
                        warn!(index, label = %label, error = %e, "Sub-tab click failed");
                        continue;
                    }
                }
                page.settle(self.config.tab_settle()).await;

                let text = self.panel_text(page).await;
                if !text.is_empty() {
                    sections.push(format!("{}\n{}", section_heading(label), text));
                }
            }
        }

        let text = sections.join("\n\n");
        let images: Vec<String> =
            evaluate_as(page, &panel_images_script(self.config.max_images))
                .await
                .unwrap_or_default();

        if text.chars().count() >= self.config.min_text_length {
            return Ok(Some(ScrapeResult {
                text,
                images,
                menu_url,
                ..Default::default()
            }));
        }

        debug!(place_id, chars = text.len(), "Map menu panel too thin");
        Ok(menu_url.map(|link| ScrapeResult {
            images,
            menu_url: Some(link),
            ..Default::default()
        }))
    }
}

#[async_trait]
impl Scraper for MapsScraper {
    async fn scrape(&self, place_id: &str) -> Result<Option<ScrapeResult>> {
        if place_id.trim().is_empty() {
            return Err(MenuError::InvalidInput("place id is empty".to_string()));
        }

        let page = self.launcher.open().await?;
        let outcome = self.scrape_page(page.as_ref(), place_id).await;
        page.close().await;

        if let Ok(Some(ref result)) = outcome {
            info!(
                place_id,
                chars = result.text.len(),
                images = result.images.len(),
                has_menu_url = result.menu_url.is_some(),
                "Map listing scraped"
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::testing::{FakeAnchor, FakeLauncher, FakeListing, ListingState};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    fn run(listing: FakeListing) -> (MapsScraper, Arc<Mutex<ListingState>>, Arc<AtomicBool>) {
        let state = listing.state.clone();
        let closed = listing.closed.clone();
        let scraper = MapsScraper::new(Arc::new(FakeLauncher(listing)), ScraperConfig::default());
        (scraper, state, closed)
    }

    fn long_text(dish: &str) -> String {
        format!("{dish} served with seasonal greens and house dressing $14. ").repeat(2)
    }

    #[test]
    fn test_place_url() {
        let url = place_url("ChIJN1t_tDeuEmsRUsoyG83frY4").unwrap();
        assert!(url.starts_with("https://www.google.com/maps/place/?q=place_id"));
        assert!(url.contains("ChIJN1t_tDeuEmsRUsoyG83frY4"));
    }

    #[test]
    fn test_outbound_link_filter() {
        assert!(is_outbound_link("https://acme-diner.com/menu"));
        assert!(is_outbound_link("http://order.toasttab.com/acme"));
        assert!(!is_outbound_link("https://www.google.com/maps/place/acme"));
        assert!(!is_outbound_link("https://maps.app.goo.gl/abc"));
        assert!(!is_outbound_link("/maps/place/acme"));
        assert!(!is_outbound_link("mailto:hi@acme-diner.com"));
    }

    fn candidate(label: &str, raw: &str, href: &str) -> LinkCandidate {
        LinkCandidate {
            href: href.to_string(),
            raw: raw.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_first_menu_link_rules() {
        let candidates = vec![
            candidate("Menu", "#menu", "https://www.google.com/maps/place/acme#menu"),
            candidate("Menu", "/maps/place/acme/menu", "https://www.google.com/maps/place/acme/menu"),
            candidate("Directions", "https://acme-diner.com/visit", "https://acme-diner.com/visit"),
            candidate("Order online", "https://order.toasttab.com/acme", "https://order.toasttab.com/acme"),
            candidate("Menu", "https://acme-diner.com/menu", "https://acme-diner.com/menu"),
        ];
        assert_eq!(
            first_menu_link(&candidates).as_deref(),
            Some("https://order.toasttab.com/acme")
        );

        let only_provider = vec![candidate(
            "View menu",
            "https://www.google.com/maps/place/acme/menu",
            "https://www.google.com/maps/place/acme/menu",
        )];
        assert_eq!(first_menu_link(&only_provider), None);
    }

    #[test]
    fn test_fragment_link_skipped_even_off_provider() {
        let candidates = vec![
            candidate("Menu", "#menu", "https://acme-diner.com/#menu"),
            candidate("MENU", "https://acme-diner.com/menu", "https://acme-diner.com/menu"),
        ];
        assert_eq!(
            first_menu_link(&candidates).as_deref(),
            Some("https://acme-diner.com/menu")
        );
    }

    #[test]
    fn test_link_scan_filters_in_page() {
        let script = outbound_link_script();
        assert!(script.contains(r#"const linkWords = ["menu", "order"];"#));
        assert!(script.contains(r#""google.""#));
        assert!(script.contains(r#""goo.gl""#));
        assert!(script.contains("raw.startsWith('#')"));
        assert!(script.contains("return menuLinkCandidates();"));
    }

    #[test]
    fn test_section_heading() {
        assert_eq!(section_heading(" Lunch "), "=== LUNCH ===");
    }

    #[test]
    fn test_scripts_carry_helpers() {
        for script in [
            outbound_link_script(),
            click_menu_tab_script(),
            sub_tab_labels_script(),
            click_sub_tab_script(2),
            scroll_panel_script(5000),
            panel_text_script(),
            panel_images_script(20),
        ] {
            assert!(script.contains("const deepQueryAll"));
        }
        assert!(click_sub_tab_script(2).contains("return clickSubTab(2);"));
        assert!(scroll_panel_script(5000).contains("overflowY"));
    }

    #[tokio::test]
    async fn test_sub_tabs_concatenated_with_headings() {
        let listing = FakeListing {
            has_menu_tab: true,
            sub_tabs: vec![
                ("Lunch".to_string(), long_text("Club sandwich")),
                ("Dinner".to_string(), long_text("Ribeye steak")),
            ],
            images: vec!["https://lh3.example.com/menu1.jpg".to_string()],
            scroll_positions: vec![0.0, 800.0, 800.0, 800.0],
            ..Default::default()
        };
        let (scraper, state, closed) = run(listing);

        let result = scraper.scrape("place-123").await.unwrap().unwrap();

        let lunch = result.text.find("=== LUNCH ===").unwrap();
        let dinner = result.text.find("=== DINNER ===").unwrap();
        assert!(lunch < dinner);
        assert!(result.text[lunch..dinner].contains("Club sandwich"));
        assert!(result.text[dinner..].contains("Ribeye steak"));
        assert_eq!(result.images, vec!["https://lh3.example.com/menu1.jpg"]);
        assert!(result.menu_url.is_none());
        assert!(closed.load(Ordering::SeqCst));

        let state = state.lock().unwrap();
        assert!(state.visited[0].contains("place-123"));
    }

    #[tokio::test]
    async fn test_scroll_stops_after_two_stable_readings() {
        let listing = FakeListing {
            has_menu_tab: true,
            single_panel: long_text("Pad thai"),
            scroll_positions: vec![0.0, 900.0],
            ..Default::default()
        };
        let (scraper, state, _) = run(listing);

        scraper.scrape("place-1").await.unwrap().unwrap();
        // 0, 900, 900 (stable once), 900 (stable twice)
        assert_eq!(state.lock().unwrap().scroll_calls, 4);
    }

    #[tokio::test]
    async fn test_scroll_bounded_by_attempts() {
        let listing = FakeListing {
            has_menu_tab: true,
            single_panel: long_text("Pad thai"),
            scroll_positions: (0..20).map(|i| i as f64 * 500.0).collect(),
            ..Default::default()
        };
        let (scraper, state, _) = run(listing);

        scraper.scrape("place-1").await.unwrap().unwrap();
        assert_eq!(
            state.lock().unwrap().scroll_calls,
            ScraperConfig::default().max_scroll_attempts as usize
        );
    }

    #[tokio::test]
    async fn test_no_menu_tab_surfaces_outbound_link() {
        let listing = FakeListing {
            links: vec![FakeAnchor::new("Menu", "https://acme-diner.com/menu")],
            has_menu_tab: false,
            ..Default::default()
        };
        let (scraper, _, closed) = run(listing);

        let result = scraper.scrape("place-1").await.unwrap().unwrap();
        assert!(result.text.is_empty());
        assert_eq!(result.menu_url.as_deref(), Some("https://acme-diner.com/menu"));
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_thin_panel_keeps_link_but_drops_text() {
        let listing = FakeListing {
            links: vec![FakeAnchor::new("Menu", "https://acme-diner.com/menu")],
            has_menu_tab: true,
            single_panel: "Burger $9".to_string(),
            scroll_positions: vec![0.0],
            ..Default::default()
        };
        let (scraper, _, _) = run(listing);

        let result = scraper.scrape("place-1").await.unwrap().unwrap();
        assert!(result.text.is_empty());
        assert_eq!(result.menu_url.as_deref(), Some("https://acme-diner.com/menu"));
    }

    #[tokio::test]
    async fn test_map_provider_link_is_ignored() {
        let listing = FakeListing {
            links: vec![FakeAnchor::new(
                "Menu",
                "https://www.google.com/maps/place/acme/menu",
            )],
            has_menu_tab: false,
            ..Default::default()
        };
        let (scraper, _, _) = run(listing);

        assert!(scraper.scrape("place-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_later_outbound_link_wins_over_provider_links() {
        let listing = FakeListing {
            links: vec![
                FakeAnchor::new("Menu", "https://www.google.com/maps/place/acme/menu"),
                FakeAnchor::fragment("Menu", "#menu", "https://www.google.com/maps/place/acme#menu"),
                FakeAnchor::new("Website", "https://acme-diner.com/"),
                FakeAnchor::new("Order pickup", "https://order.acme-diner.com/"),
            ],
            has_menu_tab: false,
            ..Default::default()
        };
        let (scraper, _, _) = run(listing);

        let result = scraper.scrape("place-1").await.unwrap().unwrap();
        assert_eq!(result.menu_url.as_deref(), Some("https://order.acme-diner.com/"));
    }

    #[tokio::test]
    async fn test_thin_panel_without_link_is_none() {
        let listing = FakeListing {
            has_menu_tab: true,
            single_panel: "Closed for renovation".to_string(),
            scroll_positions: vec![0.0],
            ..Default::default()
        };
        let (scraper, _, closed) = run(listing);

        assert!(scraper.scrape("place-1").await.unwrap().is_none());
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_empty_place_id_rejected() {
        let (scraper, _, _) = run(FakeListing::default());
        assert!(matches!(
            scraper.scrape("  ").await,
            Err(MenuError::InvalidInput(_))
        ));
    }
}
