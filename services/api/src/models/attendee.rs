//! Attendee models

use common::ServiceResult;
use serde::{Deserialize, Serialize};

use super::{
    CreatorSummary, NamedSummary, RatingRow, label_set, nullable, optional, required, social_media,
};

/// Attendee entity
#[derive(Debug, Clone, PartialEq)]
pub struct Attendee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub preferred_event_type: Option<String>,
    pub favorite_event_types: Vec<String>,
    pub social_media: Option<serde_json::Value>,
    pub creator_id: Option<i64>,
}

impl Attendee {
    pub fn set_first_name(&mut self, first_name: &str) -> ServiceResult<()> {
        self.first_name = required("first_name", first_name)?;
        Ok(())
    }

    pub fn set_last_name(&mut self, last_name: &str) -> ServiceResult<()> {
        self.last_name = required("last_name", last_name)?;
        Ok(())
    }

    pub fn set_email(&mut self, email: &str) -> ServiceResult<()> {
        self.email = required("email", email)?;
        Ok(())
    }

    pub fn set_social_media(&mut self, value: Option<serde_json::Value>) -> ServiceResult<()> {
        self.social_media = social_media(value)?;
        Ok(())
    }
}

/// New attendee creation payload
///
/// Favorite id lists extend the (empty) favorite sets of the new attendee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAttendee {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub preferred_event_type: Option<String>,
    #[serde(default)]
    pub favorite_event_types: Vec<String>,
    #[serde(default)]
    pub social_media: Option<serde_json::Value>,
    #[serde(default)]
    pub favorite_event_ids: Vec<i64>,
    #[serde(default)]
    pub favorite_artist_ids: Vec<i64>,
}

impl NewAttendee {
    pub fn to_attendee(&self, creator_id: i64) -> ServiceResult<Attendee> {
        Ok(Attendee {
            id: 0,
            first_name: required("first_name", &self.first_name)?,
            last_name: required("last_name", &self.last_name)?,
            email: required("email", &self.email)?,
            preferred_event_type: optional(self.preferred_event_type.clone()),
            favorite_event_types: label_set(self.favorite_event_types.clone()),
            social_media: social_media(self.social_media.clone())?,
            creator_id: Some(creator_id),
        })
    }
}

/// Attendee update payload; unknown fields are rejected
///
/// Favorite id lists, when present, replace the current favorite sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttendeeUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub preferred_event_type: Option<Option<String>>,
    pub favorite_event_types: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub social_media: Option<Option<serde_json::Value>>,
    pub favorite_event_ids: Option<Vec<i64>>,
    pub favorite_artist_ids: Option<Vec<i64>>,
}

impl AttendeeUpdate {
    /// Apply scalar fields; favorite links are left to the caller
    pub fn apply(&self, attendee: &mut Attendee) -> ServiceResult<()> {
        if let Some(first_name) = &self.first_name {
            attendee.set_first_name(first_name)?;
        }
        if let Some(last_name) = &self.last_name {
            attendee.set_last_name(last_name)?;
        }
        if let Some(email) = &self.email {
            attendee.set_email(email)?;
        }
        if let Some(label) = &self.preferred_event_type {
            attendee.preferred_event_type = optional(label.clone());
        }
        if let Some(labels) = &self.favorite_event_types {
            attendee.favorite_event_types = label_set(labels.clone());
        }
        if let Some(value) = &self.social_media {
            attendee.set_social_media(value.clone())?;
        }
        Ok(())
    }
}

/// Attendee read-view
#[derive(Debug, Clone, Serialize)]
pub struct AttendeeView {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub preferred_event_type: Option<String>,
    pub creator: Option<CreatorSummary>,
    pub favorite_events: Vec<NamedSummary>,
    pub favorite_event_types: Vec<String>,
    pub favorite_artists: Vec<NamedSummary>,
    pub social_media: Option<serde_json::Value>,
    pub venue_ratings: Vec<RatingRow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sam() -> NewAttendee {
        NewAttendee {
            first_name: "Sam".into(),
            last_name: "Lee".into(),
            email: "sam@x.com".into(),
            preferred_event_type: None,
            favorite_event_types: vec!["Karaoke".into(), "Karaoke".into()],
            social_media: Some(json!({"instagram": "@samlee"})),
            favorite_event_ids: vec![],
            favorite_artist_ids: vec![],
        }
    }

    #[test]
    fn favorite_event_types_behave_as_a_set() {
        let attendee = sam().to_attendee(1).unwrap();
        assert_eq!(attendee.favorite_event_types, vec!["Karaoke".to_string()]);
    }

    #[test]
    fn email_is_required() {
        let mut payload = sam();
        payload.email = "".into();
        assert!(payload.to_attendee(1).is_err());
    }

    #[test]
    fn update_rejects_non_object_social_media() {
        let mut attendee = sam().to_attendee(1).unwrap();
        let result = AttendeeUpdate {
            social_media: Some(Some(json!("@samlee"))),
            ..Default::default()
        }
        .apply(&mut attendee);
        assert!(result.is_err());
    }
}
