use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::app::error::Result;
use crate::config::Config;
use crate::delivery::MenuService;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::orchestrator::ScrapeOrchestrator;
use crate::places::GooglePlacesClient;
use crate::scraper::{ChromeLauncher, HtmlTextExtractor, MapsScraper, PageLauncher, WebsiteScraper};
use crate::store::{RestaurantStore, SqliteStore};
use crate::structuring::ChatMenuStructurer;

/// Every long-lived component, wired from one [`Config`].
pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub extractor: HtmlTextExtractor,
    pub orchestrator: Arc<ScrapeOrchestrator>,
    pub store: Option<Arc<dyn RestaurantStore>>,
    pub service: Arc<MenuService>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let store = match config.store.path.as_deref() {
            Some(path) => Some(Self::open_store(path)?),
            None => {
                warn!("No store path configured, streaming flow is unavailable");
                None
            }
        };
        Self::with_store(config, store)
    }

    /// Same wiring with an in-memory store.
    pub fn in_memory(config: Config) -> Result<Self> {
        let store: Arc<dyn RestaurantStore> = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(config, Some(store))
    }

    fn with_store(config: Config, store: Option<Arc<dyn RestaurantStore>>) -> Result<Self> {
        let scraper_config = config.scraper.clone();

        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&scraper_config)?);
        let launcher: Arc<dyn PageLauncher> = Arc::new(ChromeLauncher::new(scraper_config.clone()));

        let website = WebsiteScraper::new(fetcher.clone(), launcher.clone(), scraper_config.clone());
        let maps = MapsScraper::new(launcher, scraper_config.clone());
        let orchestrator = Arc::new(ScrapeOrchestrator::new(
            Arc::new(website),
            Arc::new(maps),
            &scraper_config,
        ));

        let places = Arc::new(GooglePlacesClient::new(&config.places)?);
        let structurer = Arc::new(ChatMenuStructurer::new(config.llm.clone())?);

        let service = Arc::new(MenuService::new(
            places,
            orchestrator.clone(),
            structurer,
            store.clone(),
        ));

        Ok(Self {
            extractor: HtmlTextExtractor::new(fetcher.clone(), &scraper_config),
            config,
            fetcher,
            orchestrator,
            store,
            service,
        })
    }

    fn open_store(path: &Path) -> Result<Arc<dyn RestaurantStore>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        info!(path = %path.display(), "Opening restaurant store");
        Ok(Arc::new(SqliteStore::new(path)?))
    }
}
