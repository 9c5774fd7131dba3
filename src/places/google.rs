use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::app::{MenuError, Result};
use crate::domain::PlaceDetails;
use crate::places::{PlaceDirectory, PlacesConfig};

const FIELD_MASK: &str = "id,displayName,formattedAddress,websiteUri,nationalPhoneNumber,\
internationalPhoneNumber,location,rating,addressComponents";

/// Address component types that name the city, in order of preference.
const CITY_TYPES: &[&str] = &["locality", "administrative_area_level_3"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceResponse {
    display_name: Option<LocalizedText>,
    #[serde(default)]
    formatted_address: String,
    website_uri: Option<String>,
    national_phone_number: Option<String>,
    international_phone_number: Option<String>,
    location: Option<LatLng>,
    rating: Option<f64>,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressComponent {
    #[serde(default)]
    long_text: String,
    #[serde(default)]
    short_text: String,
    #[serde(default)]
    types: Vec<String>,
}

impl PlaceResponse {
    fn into_details(self) -> PlaceDetails {
        let city = self
            .address_components
            .iter()
            .find(|c| c.types.iter().any(|t| CITY_TYPES.contains(&t.as_str())))
            .map(|c| c.long_text.clone())
            .filter(|c| !c.is_empty());
        let country_code = self
            .address_components
            .iter()
            .find(|c| c.types.iter().any(|t| t == "country"))
            .map(|c| c.short_text.to_uppercase())
            .filter(|c| !c.is_empty());

        PlaceDetails {
            name: self.display_name.map(|n| n.text).unwrap_or_default(),
            formatted_address: self.formatted_address,
            website_uri: self.website_uri.filter(|w| !w.trim().is_empty()),
            city,
            country_code,
            phone: self.national_phone_number.or(self.international_phone_number),
            lat: self.location.as_ref().map(|l| l.latitude),
            long: self.location.as_ref().map(|l| l.longitude),
            rating: self.rating,
        }
    }
}

/// Client for the Google Places (New) details endpoint.
pub struct GooglePlacesClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl GooglePlacesClient {
    pub fn new(config: &PlacesConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            endpoint: Url::parse(&config.endpoint)?,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    /// `{endpoint}/places/{id}` with the id percent-encoded as one segment.
    fn details_url(&self, place_id: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| MenuError::Config(format!("Places endpoint {} cannot be a base", self.endpoint)))?
            .pop_if_empty()
            .push("places")
            .push(place_id);
        Ok(url)
    }
}

#[async_trait]
impl PlaceDirectory for GooglePlacesClient {
    async fn details(&self, place_id: &str) -> Result<PlaceDetails> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MenuError::NotConfigured("Places API key".to_string()))?;

        if place_id.trim().is_empty() {
            return Err(MenuError::InvalidInput("placeId is required".to_string()));
        }

        let url = self.details_url(place_id)?;
        let response = self
            .client
            .get(url)
            .header("X-Goog-Api-Key", api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MenuError::Places(format!(
                "details for {} returned {}: {}",
                place_id,
                status,
                body.trim()
            )));
        }

        let place: PlaceResponse = response.json().await?;
        let details = place.into_details();
        debug!(
            place_id,
            name = %details.name,
            city = details.city.as_deref().unwrap_or("-"),
            has_website = details.website_uri.is_some(),
            "Place details resolved"
        );
        Ok(details)
    }
}
