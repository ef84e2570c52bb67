//! API models for request payloads, entities and read-views

use common::{ServiceError, ServiceResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod artist;
pub mod attendee;
pub mod event;
pub mod event_type;
pub mod rating;
pub mod tour;
pub mod venue;

pub use artist::{Artist, ArtistUpdate, ArtistView, NewArtist};
pub use attendee::{Attendee, AttendeeUpdate, AttendeeView, NewAttendee};
pub use event::{Event, EventUpdate, EventView, NewEvent};
pub use event_type::EVENT_TYPES;
pub use rating::{RatingRequest, RatingRow};
pub use tour::{NewTour, Tour, TourUpdate, TourView};
pub use venue::{NewVenue, Venue, VenueUpdate, VenueView};

/// Wire format of calendar dates (events and tours)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Decode a JSON object into a typed payload, reporting shape errors as
/// validation failures
pub fn from_payload<T: DeserializeOwned>(payload: serde_json::Value) -> ServiceResult<T> {
    serde_json::from_value(payload).map_err(|e| ServiceError::validation(e.to_string()))
}

/// Keep an explicit `null` apart from an absent field in update payloads
///
/// Absent decodes to `None` (via `#[serde(default)]`), `null` to `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Accept a JSON string or number as free text
pub fn free_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Ok(text),
        serde_json::Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected text or a number, got {}",
            other
        ))),
    }
}

pub(crate) fn some_free_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    free_text(deserializer).map(Some)
}

/// `{id, username}` of the user that created a resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatorSummary {
    pub id: i64,
    pub username: String,
}

/// `{id, name}` of a venue, event or artist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedSummary {
    pub id: i64,
    pub name: String,
}

/// `{id, first_name, last_name}` of an attendee
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendeeSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// Mean venue rating, or the marker for a venue nobody has rated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AverageRating {
    Rated(f64),
    Unrated,
}

impl AverageRating {
    pub const UNRATED_LABEL: &'static str = "No ratings yet";

    /// Round a raw mean to two decimals; `None` means no ratings
    pub fn from_mean(mean: Option<f64>) -> Self {
        match mean {
            Some(value) => AverageRating::Rated((value * 100.0).round() / 100.0),
            None => AverageRating::Unrated,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            AverageRating::Rated(value) => Some(*value),
            AverageRating::Unrated => None,
        }
    }
}

impl Serialize for AverageRating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AverageRating::Rated(value) => serializer.serialize_f64(*value),
            AverageRating::Unrated => serializer.serialize_str(Self::UNRATED_LABEL),
        }
    }
}

/// Trimmed, non-blank text for a required field
pub(crate) fn required(field: &str, value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Blank optional text collapses to `None`
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a calendar date in [`DATE_FORMAT`]
pub(crate) fn parse_date(field: &str, value: &str) -> ServiceResult<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ServiceError::validation(format!("{} must be a date formatted as YYYY-MM-DD", field))
    })
}

/// Social media payloads must be JSON objects
pub(crate) fn social_media(value: Option<serde_json::Value>) -> ServiceResult<Option<serde_json::Value>> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(map @ serde_json::Value::Object(_)) => Ok(Some(map)),
        Some(_) => Err(ServiceError::validation("social_media must be an object")),
    }
}

/// Drop blank and repeated labels, keeping first-seen order
pub(crate) fn label_set(labels: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.trim().to_string();
        if !label.is_empty() && !seen.contains(&label) {
            seen.push(label);
        }
    }
    seen
}
