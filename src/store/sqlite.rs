use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};
use tracing::info;

use crate::app::{MenuError, Result};
use crate::domain::{
    BrandColors, CategoryDraft, Currency, MenuDraft, MenuItem, NewRestaurant, RestaurantRecord,
    SavedRestaurant,
};
use crate::store::RestaurantStore;

const RESTAURANT_COLUMNS: &str = "r.id, r.slug, r.place_id, r.name, r.address, r.city, r.website_url,
    r.currency, r.logo, r.colors, r.description, r.created_at,
    (SELECT COUNT(*) FROM menu_categories c WHERE c.restaurant_id = r.id),
    (SELECT COUNT(*) FROM menu_items i JOIN menu_categories c ON i.category_id = c.id
     WHERE c.restaurant_id = r.id)";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;

        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| MenuError::Other(format!("Migration failed: {}", e)))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            MenuError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn restaurant_from_row(row: &Row<'_>) -> rusqlite::Result<RestaurantRecord> {
        let currency = match row.get::<_, String>(7)?.as_str() {
            "CAD" => Currency::Cad,
            _ => Currency::Usd,
        };
        let colors = row
            .get::<_, Option<String>>(9)?
            .and_then(|json| serde_json::from_str::<BrandColors>(&json).ok());

        Ok(RestaurantRecord {
            id: row.get(0)?,
            slug: row.get(1)?,
            place_id: row.get(2)?,
            name: row.get(3)?,
            address: row.get(4)?,
            city: row.get(5)?,
            website_url: row.get(6)?,
            currency,
            logo: row.get(8)?,
            colors,
            description: row.get(10)?,
            created_at: row
                .get::<_, String>(11)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            category_count: row.get::<_, i64>(12)? as usize,
            item_count: row.get::<_, i64>(13)? as usize,
        })
    }
}

impl RestaurantStore for SqliteStore {
    fn find_by_place_id(&self, place_id: &str) -> Result<Option<RestaurantRecord>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                &format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants r WHERE r.place_id = ?1"),
                params![place_id],
                Self::restaurant_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn get_restaurant(&self, id: &str) -> Result<Option<RestaurantRecord>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                &format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants r WHERE r.id = ?1"),
                params![id],
                Self::restaurant_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn save(&self, restaurant: &NewRestaurant, menu: &MenuDraft) -> Result<SavedRestaurant> {
        let id = NewRestaurant::generate_id(&restaurant.place_id);
        let slug =
            NewRestaurant::generate_slug(&restaurant.name, restaurant.city.as_deref(), &id);
        let colors = restaurant
            .colors
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO restaurants (id, slug, place_id, name, address, city, website_url,
                currency, logo, colors, description, cuisine, tags, lat, long, phone, rating, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                id,
                slug,
                restaurant.place_id,
                restaurant.name,
                restaurant.address,
                restaurant.city,
                restaurant.website_url,
                restaurant.currency.as_str(),
                restaurant.logo,
                colors,
                restaurant.description,
                restaurant.cuisine,
                serde_json::to_string(&restaurant.tags)?,
                restaurant.lat,
                restaurant.long,
                restaurant.phone,
                restaurant.rating,
                Utc::now().to_rfc3339(),
            ],
        )?;

        let mut item_count = 0;
        for (position, category) in menu
            .categories
            .iter()
            .filter(|c| !c.items.is_empty())
            .enumerate()
        {
            tx.execute(
                "INSERT INTO menu_categories (restaurant_id, name, position) VALUES (?1, ?2, ?3)",
                params![id, category.name, position as i64],
            )?;
            let category_id = tx.last_insert_rowid();

            let mut stmt = tx.prepare_cached(
                "INSERT INTO menu_items (category_id, name, description, price, tags, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (item_position, item) in category.items.iter().enumerate() {
                stmt.execute(params![
                    category_id,
                    item.name,
                    item.description,
                    item.price,
                    serde_json::to_string(&item.tags)?,
                    item_position as i64,
                ])?;
                item_count += 1;
            }
        }

        tx.commit()?;

        info!(
            place_id = %restaurant.place_id,
            slug = %slug,
            items = item_count,
            "Restaurant saved"
        );
        Ok(SavedRestaurant { id, slug })
    }

    fn get_menu(&self, restaurant_id: &str) -> Result<Vec<CategoryDraft>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT c.id, c.name, i.name, i.description, i.price, i.tags
             FROM menu_categories c
             JOIN menu_items i ON i.category_id = c.id
             WHERE c.restaurant_id = ?1
             ORDER BY c.position, i.position",
        )?;

        let rows = stmt
            .query_map(params![restaurant_id], |row| {
                let category_id: i64 = row.get(0)?;
                let category: String = row.get(1)?;
                let item = MenuItem {
                    name: row.get(2)?,
                    description: row.get(3)?,
                    price: row.get(4)?,
                    category: Some(category.clone()),
                    tags: row
                        .get::<_, String>(5)
                        .ok()
                        .and_then(|t| serde_json::from_str(&t).ok())
                        .unwrap_or_default(),
                };
                Ok((category_id, category, item))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut categories: Vec<(i64, CategoryDraft)> = Vec::new();
        for (category_id, name, item) in rows {
            match categories.last_mut() {
                Some((id, draft)) if *id == category_id => draft.items.push(item),
                _ => categories.push((
                    category_id,
                    CategoryDraft {
                        name,
                        items: vec![item],
                    },
                )),
            }
        }

        Ok(categories.into_iter().map(|(_, draft)| draft).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MenuAccumulator, MenuChunk};

    fn restaurant(place_id: &str) -> NewRestaurant {
        NewRestaurant {
            place_id: place_id.to_string(),
            name: "Acme Diner".to_string(),
            address: "12 King St W, Toronto, ON".to_string(),
            city: Some("Toronto".to_string()),
            website_url: Some("https://acme-diner.com".to_string()),
            currency: Currency::Cad,
            logo: Some("https://acme-diner.com/logo.png".to_string()),
            colors: BrandColors::from_samples(&["#8b0000", "#224466"]),
            description: Some("All-day breakfast.".to_string()),
            cuisine: Some("Diner".to_string()),
            tags: vec!["breakfast".to_string()],
            lat: Some(43.6487),
            long: Some(-79.379),
            phone: None,
            rating: Some(4.4),
        }
    }

    fn menu() -> MenuDraft {
        let mut acc = MenuAccumulator::new();
        for chunk in [
            MenuChunk::Category {
                name: "Breakfast".into(),
            },
            MenuChunk::Item(MenuItem {
                name: "Pancakes".into(),
                price: Some("$8".into()),
                category: Some("Breakfast".into()),
                ..Default::default()
            }),
            MenuChunk::Item(MenuItem {
                name: "Omelette".into(),
                category: Some("Breakfast".into()),
                ..Default::default()
            }),
            MenuChunk::Item(MenuItem {
                name: "Coffee".into(),
                category: Some("Drinks".into()),
                tags: vec!["hot".into()],
                ..Default::default()
            }),
        ] {
            acc.push(chunk);
        }
        acc.finish()
    }

    #[test]
    fn test_save_and_find() {
        let store = SqliteStore::in_memory().unwrap();

        let saved = store.save(&restaurant("P1"), &menu()).unwrap();
        assert_eq!(saved.id, NewRestaurant::generate_id("P1"));
        assert!(saved.slug.starts_with("acme-diner-toronto-"));

        let record = store.find_by_place_id("P1").unwrap().unwrap();
        assert_eq!(record.id, saved.id);
        assert_eq!(record.slug, saved.slug);
        assert_eq!(record.currency, Currency::Cad);
        assert_eq!(record.colors.unwrap().primary, "#8b0000");
        assert_eq!(record.item_count, 3);
        assert_eq!(record.category_count, 2);

        assert_eq!(store.get_restaurant(&saved.id).unwrap().unwrap().place_id, "P1");
    }

    #[test]
    fn test_find_missing() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.find_by_place_id("nope").unwrap().is_none());
    }

    #[test]
    fn test_menu_round_trip_keeps_order() {
        let store = SqliteStore::in_memory().unwrap();
        let saved = store.save(&restaurant("P1"), &menu()).unwrap();

        let categories = store.get_menu(&saved.id).unwrap();
        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Breakfast", "Drinks"]);
        let items: Vec<_> = categories[0].items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(items, vec!["Pancakes", "Omelette"]);
        assert_eq!(categories[1].items[0].tags, vec!["hot"]);
    }

    #[test]
    fn test_empty_categories_not_persisted() {
        let store = SqliteStore::in_memory().unwrap();
        let mut draft = menu();
        draft.categories.push(CategoryDraft {
            name: "Specials".into(),
            items: Vec::new(),
        });

        let saved = store.save(&restaurant("P1"), &draft).unwrap();
        assert_eq!(store.get_menu(&saved.id).unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_place_rejected() {
        let store = SqliteStore::in_memory().unwrap();
        store.save(&restaurant("P1"), &menu()).unwrap();
        assert!(store.save(&restaurant("P1"), &menu()).is_err());
        assert_eq!(store.get_menu(&NewRestaurant::generate_id("P1")).unwrap().len(), 2);
    }

    #[test]
    fn test_on_disk_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menus.db");
        {
            let store = SqliteStore::new(&path).unwrap();
            store.save(&restaurant("P1"), &MenuDraft::default()).unwrap();
        }
        let store = SqliteStore::new(&path).unwrap();
        let record = store.find_by_place_id("P1").unwrap().unwrap();
        assert_eq!(record.item_count, 0);
    }

    #[test]
    fn test_migration_failure_keeps_detail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menuscout.db");
        Connection::open(&path)
            .unwrap()
            .execute("CREATE TABLE restaurants (legacy TEXT)", [])
            .unwrap();

        match SqliteStore::new(&path) {
            Err(MenuError::Other(message)) => {
                assert!(message.starts_with("Migration failed"));
                assert!(message.contains("restaurants"), "message: {message}");
            }
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(_) => panic!("migration should fail on a conflicting schema"),
        }
    }
}
