//! Artist models

use std::collections::BTreeMap;

use common::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{AttendeeSummary, CreatorSummary, NamedSummary, nullable, optional, required};

/// Artist entity
#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub age: Option<i32>,
    pub background: Option<String>,
    /// Song titles or links, in the order the artist listed them
    pub songs: Vec<String>,
    pub creator_id: Option<i64>,
}

impl Artist {
    pub fn set_name(&mut self, name: &str) -> ServiceResult<()> {
        self.name = required("name", name)?;
        Ok(())
    }

    pub fn set_age(&mut self, age: Option<i32>) -> ServiceResult<()> {
        self.age = validate_age(age)?;
        Ok(())
    }

    pub fn set_songs(&mut self, songs: Vec<String>) {
        self.songs = clean_songs(songs);
    }
}

fn validate_age(age: Option<i32>) -> ServiceResult<Option<i32>> {
    match age {
        Some(age) if !(0..=150).contains(&age) => {
            Err(ServiceError::validation("age must be between 0 and 150"))
        }
        other => Ok(other),
    }
}

fn clean_songs(songs: Vec<String>) -> Vec<String> {
    songs
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// New artist creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArtist {
    pub name: String,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub songs: Vec<String>,
}

impl NewArtist {
    pub fn into_artist(self, creator_id: i64) -> ServiceResult<Artist> {
        Ok(Artist {
            id: 0,
            name: required("name", &self.name)?,
            age: validate_age(self.age)?,
            background: optional(self.background),
            songs: clean_songs(self.songs),
            creator_id: Some(creator_id),
        })
    }
}

/// Artist update payload
///
/// Fields outside the allow-list are collected in `ignored`, logged, and
/// otherwise left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtistUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub age: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub background: Option<Option<String>>,
    pub songs: Option<Vec<String>>,
    #[serde(flatten)]
    pub ignored: BTreeMap<String, serde_json::Value>,
}

impl ArtistUpdate {
    pub fn apply(self, artist: &mut Artist) -> ServiceResult<()> {
        for key in self.ignored.keys() {
            warn!("Artist {} has no attribute '{}'; skipping", artist.id, key);
        }

        if let Some(name) = self.name {
            artist.set_name(&name)?;
        }
        if let Some(age) = self.age {
            artist.set_age(age)?;
        }
        if let Some(background) = self.background {
            artist.background = optional(background);
        }
        if let Some(songs) = self.songs {
            artist.set_songs(songs);
        }
        Ok(())
    }
}

/// Artist read-view
#[derive(Debug, Clone, Serialize)]
pub struct ArtistView {
    pub id: i64,
    pub name: String,
    pub age: Option<i32>,
    pub background: Option<String>,
    pub events: Vec<NamedSummary>,
    pub songs: Vec<String>,
    pub favorited_by: Vec<AttendeeSummary>,
    pub creator: Option<CreatorSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::from_payload;
    use serde_json::json;

    fn artist() -> Artist {
        NewArtist {
            name: "Nina".into(),
            age: Some(30),
            background: None,
            songs: vec!["Feeling Good".into(), " ".into()],
        }
        .into_artist(1)
        .unwrap()
    }

    #[test]
    fn blank_songs_are_dropped() {
        assert_eq!(artist().songs, vec!["Feeling Good".to_string()]);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let update: ArtistUpdate =
            from_payload(json!({"name": "Nina S.", "genre": "jazz", "label": 4})).unwrap();
        assert_eq!(update.ignored.len(), 2);

        let mut artist = artist();
        update.apply(&mut artist).unwrap();
        assert_eq!(artist.name, "Nina S.");
    }

    #[test]
    fn songs_are_replaced_in_order() {
        let mut artist = artist();
        ArtistUpdate {
            songs: Some(vec!["B".into(), "A".into()]),
            ..Default::default()
        }
        .apply(&mut artist)
        .unwrap();
        assert_eq!(artist.songs, vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn negative_age_is_rejected() {
        let mut artist = artist();
        assert!(artist.set_age(Some(-1)).is_err());
    }
}
