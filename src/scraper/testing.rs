//! Scripted browser pages for exercising the scrapers without Chrome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::app::{MenuError, Result};
use crate::scraper::page::{PageDriver, PageLauncher};

#[derive(Default)]
pub struct ListingState {
    pub active_tab: Option<usize>,
    pub scroll_calls: usize,
    pub visited: Vec<String>,
}

/// An anchor on the fake listing, as the link scan would report it.
#[derive(Clone)]
pub struct FakeAnchor {
    pub label: String,
    pub raw: String,
    pub href: String,
}

impl FakeAnchor {
    pub fn new(label: &str, href: &str) -> Self {
        Self::fragment(label, href, href)
    }

    /// Anchor whose written `href` differs from the resolved URL.
    pub fn fragment(label: &str, raw: &str, href: &str) -> Self {
        Self {
            label: label.to_string(),
            raw: raw.to_string(),
            href: href.to_string(),
        }
    }
}

/// Scripted stand-in for a map listing.
#[derive(Default, Clone)]
pub struct FakeListing {
    /// Anchors in document order, before any filtering.
    pub links: Vec<FakeAnchor>,
    pub has_menu_tab: bool,
    /// `(label, text)` per sub-tab; empty means a single panel.
    pub sub_tabs: Vec<(String, String)>,
    pub single_panel: String,
    pub images: Vec<String>,
    /// Scroll positions returned on successive scrolls; the last repeats.
    pub scroll_positions: Vec<f64>,
    pub state: Arc<Mutex<ListingState>>,
    pub closed: Arc<AtomicBool>,
}

#[async_trait]
impl PageDriver for FakeListing {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.state.lock().unwrap().visited.push(url.to_string());
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let mut state = self.state.lock().unwrap();
        let value = if script.contains("return menuLinkCandidates()") {
            let links: Vec<serde_json::Value> = self
                .links
                .iter()
                .map(|a| serde_json::json!({"href": a.href, "raw": a.raw, "label": a.label}))
                .collect();
            serde_json::json!(links)
        } else if script.contains("return clickMenuTab()") {
            serde_json::json!(self.has_menu_tab)
        } else if script.contains("return subTabLabels()") {
            let labels: Vec<&str> = self.sub_tabs.iter().map(|(l, _)| l.as_str()).collect();
            serde_json::json!(labels)
        } else if let Some(rest) = script.split("return clickSubTab(").nth(1) {
            let index: usize = rest.split(')').next().unwrap().parse().unwrap();
            state.active_tab = Some(index);
            serde_json::json!(index < self.sub_tabs.len())
        } else if script.contains("return scrollPanel(") {
            let i = state.scroll_calls.min(self.scroll_positions.len().saturating_sub(1));
            state.scroll_calls += 1;
            serde_json::json!(self.scroll_positions.get(i).copied().unwrap_or(0.0))
        } else if script.contains("return panelText()") {
            let text = match state.active_tab {
                Some(i) => self.sub_tabs[i].1.clone(),
                None => self.single_panel.clone(),
            };
            serde_json::json!(text)
        } else if script.contains("return panelImages(") {
            serde_json::json!(self.images)
        } else {
            return Err(MenuError::Browser("unexpected script".to_string()));
        };
        Ok(value)
    }

    async fn content(&self) -> Result<String> {
        Ok(String::new())
    }

    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().visited.last().cloned())
    }

    async fn settle(&self, _duration: Duration) {}

    async fn close(self: Box<Self>) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub struct FakeLauncher(pub FakeListing);

#[async_trait]
impl PageLauncher for FakeLauncher {
    async fn open(&self) -> Result<Box<dyn PageDriver>> {
        Ok(Box::new(self.0.clone()))
    }
}
