//! # Menuscout
//!
//! Finds a restaurant's menu on its website and its map listing, turns the
//! scraped text into a structured menu with a language model, and persists
//! the result.
//!
//! ## Architecture
//!
//! ```text
//! Places lookup → Scrapers (website ∥ map) → Orchestrator → Structurer → Store
//! ```
//!
//! - [`scraper`]: static and rendered website scraping, map-listing scraping
//! - [`orchestrator`]: runs both scrapers concurrently and merges their text
//! - [`structuring`]: chat-completions client, single-shot and streaming
//! - [`delivery`]: the blocking and streaming request flows
//! - [`server`]: HTTP surface built with axum
//!
//! ## Quick Start
//!
//! ```bash
//! # Structure a menu and print it
//! menuscout menu ChIJN1t_tDeuEmsRUsoyG83frY4
//!
//! # Watch the streaming flow
//! menuscout stream ChIJN1t_tDeuEmsRUsoyG83frY4 --name "Acme Diner"
//!
//! # Run the server
//! menuscout serve
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// fetcher, browser launcher, scrapers, clients, store and the menu service.
pub mod app;

/// Command-line interface using clap.
///
/// - `serve` - Run the HTTP server
/// - `menu <place-id>` - Blocking flow, prints JSON
/// - `scrape <place-id> [--website <url>]` - Scrape only
/// - `stream <place-id> [--name <name>]` - Streaming flow, prints SSE frames
/// - `extract <url>` - Run the HTML extractor on one page
pub mod cli;

/// Configuration loaded from `~/.config/menuscout/config.toml`, with
/// credential overrides from the environment.
pub mod config;

/// Request flows and the events of the streaming flow.
pub mod delivery;

/// Core domain models.
///
/// - [`ScrapeResult`](domain::ScrapeResult): what one scraper found
/// - [`MenuChunk`](domain::MenuChunk): one incremental piece of a structured menu
/// - [`MenuAccumulator`](domain::MenuAccumulator): folds chunks into a menu draft
pub mod domain;

/// Plain HTTP fetching of HTML pages.
pub mod fetcher;

/// Concurrent scraping of both sources under one deadline.
pub mod orchestrator;

/// Place-details lookup.
pub mod places;

/// Web scraping for menu text and branding.
///
/// Uses headless Chrome via chromiumoxide for pages that need rendering,
/// behind the [`PageDriver`](scraper::PageDriver) and
/// [`PageLauncher`](scraper::PageLauncher) traits.
///
/// - [`WebsiteScraper`](scraper::WebsiteScraper): restaurant website
/// - [`MapsScraper`](scraper::MapsScraper): map listing menu panel
/// - [`Scraper`](scraper::Scraper): async trait shared by both
pub mod scraper;

/// HTTP server: health, blocking menu and event stream routes.
pub mod server;

/// SQLite persistence layer.
///
/// - [`RestaurantStore`](store::RestaurantStore): trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// Menu structuring with a language model.
pub mod structuring;
