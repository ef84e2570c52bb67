//! Event models

use chrono::NaiveDate;
use common::ServiceResult;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{AttendeeSummary, CreatorSummary, NamedSummary, event_type, nullable, parse_date, required};

/// Event entity
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    /// Free text, conventionally HH:MM
    pub time: String,
    pub location: String,
    pub description: String,
    pub event_type: String,
    pub venue_id: Option<i64>,
    pub creator_id: Option<i64>,
}

impl Event {
    pub fn set_name(&mut self, name: &str) -> ServiceResult<()> {
        self.name = required("name", name)?;
        Ok(())
    }

    pub fn set_date(&mut self, date: &str) -> ServiceResult<()> {
        self.date = parse_date("date", date)?;
        Ok(())
    }

    pub fn set_time(&mut self, time: &str) -> ServiceResult<()> {
        self.time = required("time", time)?;
        Ok(())
    }

    pub fn set_location(&mut self, location: &str) -> ServiceResult<()> {
        self.location = required("location", location)?;
        Ok(())
    }

    pub fn set_description(&mut self, description: &str) -> ServiceResult<()> {
        self.description = required("description", description)?;
        Ok(())
    }

    pub fn set_event_type(&mut self, label: &str) -> ServiceResult<()> {
        self.event_type = checked_event_type(label)?;
        Ok(())
    }
}

/// Event types are free-form; labels outside the vocabulary only warn
fn checked_event_type(label: &str) -> ServiceResult<String> {
    let label = required("event_type", label)?;
    if !event_type::is_known(&label) {
        warn!("Event type '{}' is not in the published vocabulary", label);
    }
    Ok(label)
}

/// New event creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub description: String,
    pub event_type: String,
    #[serde(default)]
    pub venue_id: Option<i64>,
    #[serde(default)]
    pub artist_ids: Option<Vec<i64>>,
}

impl NewEvent {
    pub fn to_event(&self, creator_id: i64) -> ServiceResult<Event> {
        Ok(Event {
            id: 0,
            name: required("name", &self.name)?,
            date: parse_date("date", &self.date)?,
            time: required("time", &self.time)?,
            location: required("location", &self.location)?,
            description: required("description", &self.description)?,
            event_type: checked_event_type(&self.event_type)?,
            venue_id: self.venue_id,
            creator_id: Some(creator_id),
        })
    }
}

/// Event update payload; unknown fields are rejected
///
/// `artist_ids`, when present, replaces the whole artist line-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<String>,
    /// `null` detaches the event from its venue
    #[serde(default, deserialize_with = "nullable")]
    pub venue_id: Option<Option<i64>>,
    pub artist_ids: Option<Vec<i64>>,
}

impl EventUpdate {
    /// Apply scalar fields; association fields are left to the caller
    pub fn apply(&self, event: &mut Event) -> ServiceResult<()> {
        if let Some(name) = &self.name {
            event.set_name(name)?;
        }
        if let Some(date) = &self.date {
            event.set_date(date)?;
        }
        if let Some(time) = &self.time {
            event.set_time(time)?;
        }
        if let Some(location) = &self.location {
            event.set_location(location)?;
        }
        if let Some(description) = &self.description {
            event.set_description(description)?;
        }
        if let Some(label) = &self.event_type {
            event.set_event_type(label)?;
        }
        if let Some(venue_id) = self.venue_id {
            event.venue_id = venue_id;
        }
        Ok(())
    }
}

/// Event read-view
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    pub id: i64,
    pub name: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub description: String,
    pub event_type: String,
    pub creator: Option<CreatorSummary>,
    pub venue: Option<NamedSummary>,
    pub attendees: Vec<AttendeeSummary>,
    pub artists: Vec<NamedSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ServiceError;

    fn jazz_night() -> NewEvent {
        NewEvent {
            name: "Jazz Night".into(),
            date: "2025-03-01".into(),
            time: "20:00".into(),
            location: "Main Hall".into(),
            description: "...".into(),
            event_type: "Karaoke".into(),
            venue_id: None,
            artist_ids: None,
        }
    }

    #[test]
    fn parses_calendar_date() {
        let event = jazz_night().to_event(1).unwrap();
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn malformed_date_is_rejected() {
        let mut payload = jazz_night();
        payload.date = "March 1st".into();
        assert!(matches!(payload.to_event(1), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn event_type_outside_vocabulary_is_accepted() {
        let mut payload = jazz_night();
        payload.event_type = "Silent Disco".into();
        assert_eq!(payload.to_event(1).unwrap().event_type, "Silent Disco");
    }

    #[test]
    fn event_type_is_required() {
        let mut payload = jazz_night();
        payload.event_type = "".into();
        assert!(payload.to_event(1).is_err());
    }

    #[test]
    fn update_reparses_date() {
        let mut event = jazz_night().to_event(1).unwrap();
        EventUpdate {
            date: Some("2025-04-02".into()),
            ..Default::default()
        }
        .apply(&mut event)
        .unwrap();
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 4, 2).unwrap());
    }
}
