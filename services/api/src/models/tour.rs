//! Tour models

use chrono::NaiveDate;
use common::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};

use super::{CreatorSummary, nullable, optional, parse_date, required, social_media};

/// Tour entity
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: Option<String>,
    pub social_media: Option<serde_json::Value>,
    pub creator_id: Option<i64>,
}

impl Tour {
    pub fn set_name(&mut self, name: &str) -> ServiceResult<()> {
        self.name = required("name", name)?;
        Ok(())
    }

    /// Set either or both dates, then re-check their order
    pub fn set_dates(&mut self, start: Option<&str>, end: Option<&str>) -> ServiceResult<()> {
        let start_date = match start {
            Some(raw) => parse_date("start_date", raw)?,
            None => self.start_date,
        };
        let end_date = match end {
            Some(raw) => parse_date("end_date", raw)?,
            None => self.end_date,
        };
        check_order(start_date, end_date)?;
        self.start_date = start_date;
        self.end_date = end_date;
        Ok(())
    }
}

fn check_order(start: NaiveDate, end: NaiveDate) -> ServiceResult<()> {
    if end < start {
        return Err(ServiceError::validation(
            "end_date must not be before start_date",
        ));
    }
    Ok(())
}

/// New tour creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTour {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub social_media: Option<serde_json::Value>,
    #[serde(default)]
    pub event_ids: Vec<i64>,
}

impl NewTour {
    pub fn to_tour(&self, creator_id: i64) -> ServiceResult<Tour> {
        let start_date = parse_date("start_date", &self.start_date)?;
        let end_date = parse_date("end_date", &self.end_date)?;
        check_order(start_date, end_date)?;

        Ok(Tour {
            id: 0,
            name: required("name", &self.name)?,
            start_date,
            end_date,
            description: optional(self.description.clone()),
            social_media: social_media(self.social_media.clone())?,
            creator_id: Some(creator_id),
        })
    }
}

/// Tour update payload; unknown fields are rejected
///
/// `event_ids`, when present, replaces the tour's event roster.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TourUpdate {
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub social_media: Option<Option<serde_json::Value>>,
    pub event_ids: Option<Vec<i64>>,
}

impl TourUpdate {
    pub fn apply(&self, tour: &mut Tour) -> ServiceResult<()> {
        if let Some(name) = &self.name {
            tour.set_name(name)?;
        }
        if self.start_date.is_some() || self.end_date.is_some() {
            tour.set_dates(self.start_date.as_deref(), self.end_date.as_deref())?;
        }
        if let Some(description) = &self.description {
            tour.description = optional(description.clone());
        }
        if let Some(value) = &self.social_media {
            tour.social_media = social_media(value.clone())?;
        }
        Ok(())
    }
}

/// Tour read-view
#[derive(Debug, Clone, Serialize)]
pub struct TourView {
    pub id: i64,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub description: Option<String>,
    pub creator: Option<CreatorSummary>,
    pub social_media: Option<serde_json::Value>,
    pub events: Vec<String>,
}
