pub mod sqlite;

use crate::app::Result;
use crate::domain::{CategoryDraft, MenuDraft, NewRestaurant, RestaurantRecord, SavedRestaurant};

pub use sqlite::SqliteStore;

pub trait RestaurantStore: Send + Sync {
    // Restaurant operations
    fn find_by_place_id(&self, place_id: &str) -> Result<Option<RestaurantRecord>>;
    fn get_restaurant(&self, id: &str) -> Result<Option<RestaurantRecord>>;

    /// Persist a restaurant together with its menu in one transaction.
    fn save(&self, restaurant: &NewRestaurant, menu: &MenuDraft) -> Result<SavedRestaurant>;

    // Menu operations
    fn get_menu(&self, restaurant_id: &str) -> Result<Vec<CategoryDraft>>;
}
