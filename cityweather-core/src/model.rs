use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ValidationError("Latitude must be between -90 and 90".into()));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError("Longitude must be between -180 and 180".into()));
        }
        Ok(())
    }
}

/// A location a user keeps around for quick weather lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCity {
    pub id: String,
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
    /// Friend or family member living there.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_name: Option<String>,
    /// "Family", "Friend", "Colleague", ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    pub is_favorite: bool,
    pub added_date: DateTime<Utc>,
}

impl SavedCity {
    pub fn same_place(&self, name: &str, country: &str) -> bool {
        self.name == name && self.country == country
    }
}

/// Optional request field that may be omitted but not sent as `null`.
fn reject_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)?
        .map(Some)
        .ok_or_else(|| de::Error::custom("null is not allowed, omit the field instead"))
}

/// Body of an add request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSavedCity {
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
    #[serde(default, deserialize_with = "reject_null")]
    pub person_name: Option<String>,
    #[serde(default, deserialize_with = "reject_null")]
    pub relationship: Option<String>,
    #[serde(default, deserialize_with = "reject_null")]
    pub is_favorite: Option<bool>,
}

impl NewSavedCity {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError("City name is required".into()));
        }
        if self.country.trim().is_empty() {
            return Err(ValidationError("Country is required".into()));
        }
        self.coordinates.validate()
    }
}

/// Body of an update request. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCityPatch {
    #[serde(default, deserialize_with = "reject_null")]
    pub person_name: Option<String>,
    #[serde(default, deserialize_with = "reject_null")]
    pub relationship: Option<String>,
    #[serde(default, deserialize_with = "reject_null")]
    pub is_favorite: Option<bool>,
}

impl SavedCityPatch {
    pub fn apply_to(self, city: &mut SavedCity) {
        if let Some(person_name) = self.person_name {
            city.person_name = Some(person_name);
        }
        if let Some(relationship) = self.relationship {
            city.relationship = Some(relationship);
        }
        if let Some(is_favorite) = self.is_favorite {
            city.is_favorite = is_favorite;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub code: u32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

/// Degrees Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Temperature {
    pub current: f64,
    pub feels_like: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Metres per second.
    pub speed: f64,
    /// Meteorological degrees.
    pub direction: f64,
}

/// Current conditions for one city, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub coordinates: Coordinates,
    pub conditions: Vec<WeatherCondition>,
    pub temperature: Temperature,
    /// hPa
    pub pressure: f64,
    /// Percent.
    pub humidity: u8,
    pub wind: Wind,
    /// Percent.
    pub cloud_coverage: u8,
    pub country: String,
    /// Unix seconds.
    pub sunrise: i64,
    /// Unix seconds.
    pub sunset: i64,
    pub city_name: String,
    pub status_code: u16,
}

/// A user record as held by the external store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    /// Bearer tokens of the user's live sessions.
    #[serde(default)]
    pub sessions: Vec<String>,
    /// `None` when the user never saved anything, which is not the same as an emptied list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_cities: Option<Vec<SavedCity>>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            sessions: Vec::new(),
            saved_cities: None,
        }
    }

    pub fn with_session(mut self, token: impl Into<String>) -> Self {
        self.sessions.push(token.into());
        self
    }

    pub fn has_session(&self, token: &str) -> bool {
        self.sessions.iter().any(|s| s == token)
    }
}

/// One entry of the "weather for my saved cities" result.
#[derive(Debug, Clone, PartialEq)]
pub enum CityWeather {
    Complete(SavedCity, WeatherSnapshot),
    /// The lookup failed; the city is still reported, just without weather.
    Partial(SavedCity),
}

impl CityWeather {
    pub fn city(&self) -> &SavedCity {
        match self {
            CityWeather::Complete(city, _) | CityWeather::Partial(city) => city,
        }
    }

    pub fn weather(&self) -> Option<&WeatherSnapshot> {
        match self {
            CityWeather::Complete(_, weather) => Some(weather),
            CityWeather::Partial(_) => None,
        }
    }
}

impl Serialize for CityWeather {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Annotated<'a> {
            #[serde(flatten)]
            city: &'a SavedCity,
            #[serde(skip_serializing_if = "Option::is_none")]
            weather: Option<&'a WeatherSnapshot>,
        }

        Annotated {
            city: self.city(),
            weather: self.weather(),
        }
        .serialize(serializer)
    }
}
