//! Request flows built on the scrape orchestrator and the menu structurer.
//!
//! The blocking flow answers with one [`MenuResponse`]. The streaming flow
//! reports progress as [`StreamEvent`]s and persists the finished menu.
//! Every streaming run ends with exactly one `complete` or `error` event.

mod events;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::app::{MenuError, Result};
use crate::domain::{
    BrandColors, MenuAccumulator, NewRestaurant, PlaceRef, ScrapeOutcome, StructuredMenu,
};
use crate::orchestrator::ScrapeOrchestrator;
use crate::places::PlaceDirectory;
use crate::store::RestaurantStore;
use crate::structuring::{MenuStructurer, PLACEHOLDER_TEXT};

pub use events::{EventSink, RestaurantInfo, StreamEvent, TOTAL_STEPS};

/// Body of a streaming request: the place plus whatever the caller knows.
pub type StreamRequest = PlaceRef;

/// Raw material behind a blocking response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugPayload {
    pub website_text: Option<String>,
    pub map_text: Option<String>,
    pub logo: Option<String>,
    pub colors: Option<BrandColors>,
    pub menu_url: Option<String>,
    pub llm_input: String,
    pub input_length: usize,
}

impl DebugPayload {
    fn from_outcome(outcome: &ScrapeOutcome, llm_input: &str) -> Self {
        Self {
            website_text: outcome.website.as_ref().map(|w| w.text.clone()),
            map_text: outcome.map.as_ref().map(|m| m.text.clone()),
            logo: outcome.combined.logo.clone(),
            colors: outcome.combined.colors.clone(),
            menu_url: outcome.combined.menu_url.clone(),
            llm_input: llm_input.to_string(),
            input_length: llm_input.chars().count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuResponse {
    pub restaurant: RestaurantInfo,
    pub menu: StructuredMenu,
    pub debug: DebugPayload,
}

pub struct MenuService {
    places: Arc<dyn PlaceDirectory>,
    orchestrator: Arc<ScrapeOrchestrator>,
    structurer: Arc<dyn MenuStructurer>,
    store: Option<Arc<dyn RestaurantStore>>,
}

impl MenuService {
    pub fn new(
        places: Arc<dyn PlaceDirectory>,
        orchestrator: Arc<ScrapeOrchestrator>,
        structurer: Arc<dyn MenuStructurer>,
        store: Option<Arc<dyn RestaurantStore>>,
    ) -> Self {
        Self {
            places,
            orchestrator,
            structurer,
            store,
        }
    }

    /// Look up, scrape and structure a place's menu in one call.
    pub async fn menu(&self, place: &PlaceRef) -> Result<MenuResponse> {
        let place_id = require_place_id(place)?;

        let details = self.places.details(place_id).await?;
        let mut restaurant = RestaurantInfo::from_lookup(place, &details);

        let outcome = self
            .orchestrator
            .scrape_all(place_id, details.website_uri.as_deref())
            .await;

        let combined = &outcome.combined;
        let (llm_input, menu) = if combined.text.is_empty() {
            (PLACEHOLDER_TEXT, StructuredMenu::default())
        } else {
            let menu = self
                .structurer
                .parse(&combined.text, &restaurant.name, outcome.has_website_content)
                .await?;
            (combined.text.as_str(), menu)
        };
        let debug = DebugPayload::from_outcome(&outcome, llm_input);

        restaurant.logo = combined.logo.clone();
        restaurant.colors = combined.colors.clone();
        restaurant.menu_url = combined.menu_url.clone();

        info!(place_id, items = menu.items.len(), "Menu built");
        Ok(MenuResponse {
            restaurant,
            menu,
            debug,
        })
    }

    /// Run the streaming flow, reporting through `sink`.
    pub async fn stream(&self, request: &StreamRequest, sink: &EventSink) {
        sink.emit(StreamEvent::status(1, "Finding menu"));

        let terminal = match self.stream_inner(request, sink).await {
            Ok(complete) => complete,
            Err(e) => {
                error!(place_id = %request.place_id, error = %e, "Menu stream failed");
                StreamEvent::Error {
                    message: e.to_string(),
                }
            }
        };
        sink.emit(terminal);
    }

    /// Spawn the streaming flow and hand back its events.
    pub fn spawn_stream(
        self: &Arc<Self>,
        request: StreamRequest,
    ) -> tokio::sync::mpsc::UnboundedReceiver<StreamEvent> {
        let (sink, rx) = EventSink::channel();
        let service = Arc::clone(self);
        tokio::spawn(async move {
            service.stream(&request, &sink).await;
        });
        rx
    }

    /// Everything between the first status and the terminal event. Returns
    /// the `complete` event; any error becomes the `error` event.
    async fn stream_inner(&self, request: &StreamRequest, sink: &EventSink) -> Result<StreamEvent> {
        let place_id = require_place_id(request)?;
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| MenuError::NotConfigured("Restaurant store".to_string()))?;

        if let Some(existing) = store.find_by_place_id(place_id)? {
            info!(place_id, slug = %existing.slug, "Restaurant already stored");
            let menu = store.get_menu(&existing.id)?;
            return Ok(StreamEvent::Complete {
                restaurant_id: existing.id.clone(),
                slug: existing.slug.clone(),
                item_count: existing.item_count,
                category_count: existing.category_count,
                existing: true,
                restaurant: Some(existing),
                menu: Some(menu),
            });
        }

        let details = self.places.details(place_id).await?;
        let restaurant = RestaurantInfo::from_lookup(request, &details);
        sink.emit(StreamEvent::RestaurantInfo {
            restaurant: restaurant.clone(),
        });

        let outcome = self
            .orchestrator
            .scrape_all(place_id, details.website_uri.as_deref())
            .await;
        let combined = outcome.combined;
        if combined.has_branding() {
            sink.emit(StreamEvent::Branding {
                logo: combined.logo.clone(),
                colors: combined.colors.clone(),
            });
        }

        sink.emit(StreamEvent::status(2, "Crafting menu"));
        let text = if combined.text.is_empty() {
            PLACEHOLDER_TEXT
        } else {
            combined.text.as_str()
        };
        let mut accumulator = MenuAccumulator::new();
        self.structurer
            .parse_stream(
                text,
                &restaurant.name,
                outcome.has_website_content,
                &mut |chunk| {
                    accumulator.push(chunk.clone());
                    sink.emit(StreamEvent::MenuChunk { chunk });
                },
            )
            .await?;

        sink.emit(StreamEvent::status(3, "Saving menu"));
        let draft = accumulator.finish();
        let new_restaurant = NewRestaurant {
            place_id: place_id.to_string(),
            name: restaurant.name,
            address: restaurant.address,
            city: restaurant.city,
            website_url: restaurant.website_url,
            currency: details.currency(),
            logo: combined.logo,
            colors: combined.colors,
            description: draft.description.clone(),
            cuisine: draft.cuisine.clone(),
            tags: draft.tags.clone(),
            lat: restaurant.lat,
            long: restaurant.long,
            phone: restaurant.phone,
            rating: restaurant.rating,
        };
        let saved = store.save(&new_restaurant, &draft)?;

        Ok(StreamEvent::Complete {
            restaurant_id: saved.id.clone(),
            slug: saved.slug,
            item_count: draft.item_count(),
            category_count: draft.category_count(),
            existing: false,
            restaurant: store.get_restaurant(&saved.id)?,
            menu: None,
        })
    }
}

fn require_place_id(place: &PlaceRef) -> Result<&str> {
    let place_id = place.place_id.trim();
    if place_id.is_empty() {
        return Err(MenuError::InvalidInput("placeId is required".to_string()));
    }
    Ok(place_id)
}
