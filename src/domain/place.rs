use serde::{Deserialize, Serialize};

/// A place as identified by the caller, plus whatever the caller already knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRef {
    #[serde(default)]
    pub place_id: String,
    #[serde(default, alias = "restaurantName")]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub long: Option<f64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl PlaceRef {
    pub fn new(place_id: impl Into<String>) -> Self {
        Self {
            place_id: place_id.into(),
            ..Default::default()
        }
    }
}

/// Details returned by the place-details provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetails {
    pub name: String,
    pub formatted_address: String,
    pub website_uri: Option<String>,
    pub city: Option<String>,
    pub country_code: Option<String>,
    pub phone: Option<String>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub rating: Option<f64>,
}

impl PlaceDetails {
    pub fn currency(&self) -> Currency {
        Currency::for_country(self.country_code.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Cad,
    Usd,
}

impl Currency {
    /// `CA` is the only country priced in Canadian dollars; everything else,
    /// including an unknown country, is priced in US dollars.
    pub fn for_country(country_code: Option<&str>) -> Self {
        match country_code {
            Some(code) if code.eq_ignore_ascii_case("CA") => Currency::Cad,
            _ => Currency::Usd,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Cad => "CAD",
            Currency::Usd => "USD",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
