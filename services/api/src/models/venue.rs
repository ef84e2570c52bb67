//! Venue models

use common::ServiceResult;
use serde::{Deserialize, Serialize};

use super::{
    AverageRating, CreatorSummary, NamedSummary, RatingRow, free_text, nullable, optional, required,
    some_free_text,
};

/// Venue entity
#[derive(Debug, Clone, PartialEq)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub organizer: String,
    pub email: String,
    /// Free text; never interpreted as a number
    pub earnings: String,
    pub description: Option<String>,
    pub creator_id: Option<i64>,
}

impl Venue {
    pub fn set_name(&mut self, name: &str) -> ServiceResult<()> {
        self.name = required("name", name)?;
        Ok(())
    }

    pub fn set_organizer(&mut self, organizer: &str) -> ServiceResult<()> {
        self.organizer = required("organizer", organizer)?;
        Ok(())
    }

    pub fn set_email(&mut self, email: &str) -> ServiceResult<()> {
        self.email = required("email", email)?;
        Ok(())
    }

    pub fn set_earnings(&mut self, earnings: &str) -> ServiceResult<()> {
        self.earnings = required("earnings", earnings)?;
        Ok(())
    }
}

/// New venue creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVenue {
    pub name: String,
    pub organizer: String,
    pub email: String,
    #[serde(deserialize_with = "free_text")]
    pub earnings: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewVenue {
    /// Validate and normalize into an unsaved entity
    pub fn into_venue(self, creator_id: i64) -> ServiceResult<Venue> {
        Ok(Venue {
            id: 0,
            name: required("name", &self.name)?,
            organizer: required("organizer", &self.organizer)?,
            email: required("email", &self.email)?,
            earnings: required("earnings", &self.earnings)?,
            description: optional(self.description),
            creator_id: Some(creator_id),
        })
    }
}

/// Venue update payload; unknown fields are rejected
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VenueUpdate {
    pub name: Option<String>,
    pub organizer: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "some_free_text")]
    pub earnings: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
}

impl VenueUpdate {
    pub fn apply(self, venue: &mut Venue) -> ServiceResult<()> {
        if let Some(name) = self.name {
            venue.set_name(&name)?;
        }
        if let Some(organizer) = self.organizer {
            venue.set_organizer(&organizer)?;
        }
        if let Some(email) = self.email {
            venue.set_email(&email)?;
        }
        if let Some(earnings) = self.earnings {
            venue.set_earnings(&earnings)?;
        }
        if let Some(description) = self.description {
            venue.description = optional(description);
        }
        Ok(())
    }
}

/// Venue read-view
#[derive(Debug, Clone, Serialize)]
pub struct VenueView {
    pub id: i64,
    pub name: String,
    pub organizer: String,
    pub email: String,
    pub earnings: String,
    pub description: Option<String>,
    pub creator: Option<CreatorSummary>,
    pub events: Vec<NamedSummary>,
    pub ratings: Vec<RatingRow>,
    pub average_rating: AverageRating,
}
