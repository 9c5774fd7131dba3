use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::domain::{
    BrandColors, CategoryDraft, MenuChunk, PlaceDetails, PlaceRef, RestaurantRecord,
};

/// Number of progress steps reported by `status` events.
pub const TOTAL_STEPS: u8 = 3;

/// Restaurant metadata as reported to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantInfo {
    pub place_id: String,
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<BrandColors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_url: Option<String>,
}

impl RestaurantInfo {
    /// Merge looked-up details with what the caller already supplied.
    /// Caller values win for name, address and the contact fields.
    pub fn from_lookup(place: &PlaceRef, details: &PlaceDetails) -> Self {
        let given = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());

        Self {
            place_id: place.place_id.clone(),
            name: given(&place.name).unwrap_or_else(|| details.name.clone()),
            address: given(&place.address).unwrap_or_else(|| details.formatted_address.clone()),
            city: details.city.clone(),
            country_code: details.country_code.clone(),
            currency: details.currency().to_string(),
            website_url: details.website_uri.clone(),
            phone: given(&place.phone).or_else(|| details.phone.clone()),
            lat: place.lat.or(details.lat),
            long: place.long.or(details.long),
            rating: place.rating.or(details.rating),
            ..Default::default()
        }
    }
}

/// One server-push event of the streaming flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum StreamEvent {
    Status {
        step: u8,
        total_steps: u8,
        message: String,
    },
    RestaurantInfo {
        restaurant: RestaurantInfo,
    },
    Branding {
        #[serde(skip_serializing_if = "Option::is_none")]
        logo: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        colors: Option<BrandColors>,
    },
    MenuChunk {
        chunk: MenuChunk,
    },
    Complete {
        restaurant_id: String,
        slug: String,
        item_count: usize,
        category_count: usize,
        /// Whether the restaurant was already stored before this request.
        existing: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        restaurant: Option<RestaurantRecord>,
        /// Stored categories, sent only for an already stored restaurant.
        #[serde(skip_serializing_if = "Option::is_none")]
        menu: Option<Vec<CategoryDraft>>,
    },
    Error {
        message: String,
    },
}

impl StreamEvent {
    pub fn status(step: u8, message: impl Into<String>) -> Self {
        StreamEvent::Status {
            step,
            total_steps: TOTAL_STEPS,
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete { .. } | StreamEvent::Error { .. })
    }

    /// Server-sent events wire form: `data: <json>\n\n`.
    pub fn frame(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"event encoding failed: {}"}}"#, e)
        });
        format!("data: {}\n\n", json)
    }
}

/// Sending half of a stream. Events sent after the receiver is gone are
/// dropped; the flow runs to completion regardless.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: StreamEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Stream receiver closed, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_value(StreamEvent::status(1, "Finding menu")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "status", "step": 1, "totalSteps": 3, "message": "Finding menu"})
        );
    }

    #[test]
    fn test_chunk_event_nests_chunk() {
        let event = StreamEvent::MenuChunk {
            chunk: MenuChunk::Category {
                name: "Lunch".into(),
            },
        };
        assert_eq!(
            event.frame(),
            "data: {\"type\":\"menu_chunk\",\"chunk\":{\"kind\":\"category\",\"name\":\"Lunch\"}}\n\n"
        );
    }

    #[test]
    fn test_complete_wire_format() {
        let json = serde_json::to_value(StreamEvent::Complete {
            restaurant_id: "abc".into(),
            slug: "acme-abc".into(),
            item_count: 4,
            category_count: 2,
            existing: false,
            restaurant: None,
            menu: None,
        })
        .unwrap();
        assert_eq!(json["type"], "complete");
        assert_eq!(json["restaurantId"], "abc");
        assert_eq!(json["itemCount"], 4);
        assert_eq!(json["categoryCount"], 2);
        assert!(json.get("restaurant").is_none());
        assert!(json.get("menu").is_none());
    }

    #[test]
    fn test_terminal_events() {
        assert!(StreamEvent::Error {
            message: "boom".into()
        }
        .is_terminal());
        assert!(!StreamEvent::status(2, "Crafting menu").is_terminal());
    }

    #[test]
    fn test_info_prefers_caller_values() {
        let place = PlaceRef {
            place_id: "P1".into(),
            name: Some("Acme".into()),
            phone: Some("  ".into()),
            rating: Some(4.9),
            ..Default::default()
        };
        let details = PlaceDetails {
            name: "Acme Diner".into(),
            formatted_address: "12 King St W".into(),
            phone: Some("(416) 555-0100".into()),
            country_code: Some("CA".into()),
            rating: Some(4.4),
            ..Default::default()
        };

        let info = RestaurantInfo::from_lookup(&place, &details);
        assert_eq!(info.name, "Acme");
        assert_eq!(info.address, "12 King St W");
        assert_eq!(info.phone.as_deref(), Some("(416) 555-0100"));
        assert_eq!(info.rating, Some(4.9));
        assert_eq!(info.currency, "CAD");
    }
}
