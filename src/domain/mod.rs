pub mod menu;
pub mod place;
pub mod restaurant;
pub mod scrape;

pub use menu::{
    CategoryDraft, MenuAccumulator, MenuChunk, MenuDraft, MenuItem, StructuredMenu,
    DEFAULT_CATEGORY,
};
pub use place::{Currency, PlaceDetails, PlaceRef};
pub use restaurant::{NewRestaurant, RestaurantRecord, SavedRestaurant};
pub use scrape::{
    normalize_color, BrandColors, CombinedContent, ScrapeOutcome, ScrapeResult,
    USABLE_TEXT_FLOOR,
};
