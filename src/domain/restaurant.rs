use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{BrandColors, Currency};

/// Restaurant data handed to the store alongside a menu draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRestaurant {
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub city: Option<String>,
    pub website_url: Option<String>,
    pub currency: Currency,
    pub logo: Option<String>,
    pub colors: Option<BrandColors>,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    pub tags: Vec<String>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub phone: Option<String>,
    pub rating: Option<f64>,
}

impl NewRestaurant {
    /// Deterministic ID derived from the place id.
    pub fn generate_id(place_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(place_id.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// URL slug: `name-city-<first 6 hex chars of the id>`.
    pub fn generate_slug(name: &str, city: Option<&str>, id: &str) -> String {
        let mut base = slugify(name);
        if let Some(city) = city.map(slugify).filter(|c| !c.is_empty()) {
            if !base.is_empty() {
                base.push('-');
            }
            base.push_str(&city);
        }
        let suffix = &id[..id.len().min(6)];
        if base.is_empty() {
            suffix.to_string()
        } else {
            format!("{base}-{suffix}")
        }
    }
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// A persisted restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantRecord {
    pub id: String,
    pub slug: String,
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub city: Option<String>,
    pub website_url: Option<String>,
    pub currency: Currency,
    pub logo: Option<String>,
    pub colors: Option<BrandColors>,
    pub description: Option<String>,
    pub item_count: usize,
    pub category_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRestaurant {
    pub id: String,
    pub slug: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generation_deterministic() {
        let id1 = NewRestaurant::generate_id("ChIJ123");
        let id2 = NewRestaurant::generate_id("ChIJ123");
        assert_eq!(id1, id2);
        assert_ne!(id1, NewRestaurant::generate_id("ChIJ456"));
        assert_eq!(id1.len(), 64);
    }

    #[test]
    fn test_slug_generation() {
        let id = NewRestaurant::generate_id("ChIJ123");
        let slug = NewRestaurant::generate_slug("Joe's Diner & Bar", Some("Toronto"), &id);
        assert_eq!(slug, format!("joe-s-diner-bar-toronto-{}", &id[..6]));
    }

    #[test]
    fn test_slug_without_city_or_name() {
        let id = NewRestaurant::generate_id("ChIJ123");
        assert_eq!(
            NewRestaurant::generate_slug("Café", None, &id),
            format!("caf-{}", &id[..6])
        );
        assert_eq!(NewRestaurant::generate_slug("!!!", Some(""), &id), &id[..6]);
    }
}
