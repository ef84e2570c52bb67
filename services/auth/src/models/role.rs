//! Role model and related functionality

use common::ServiceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role carried by every user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Attendee,
    Artist,
    Venue,
}

impl Role {
    /// Every assignable role, in display order
    pub const ALL: [Role; 4] = [Role::Admin, Role::Attendee, Role::Artist, Role::Venue];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Attendee => "attendee",
            Role::Artist => "artist",
            Role::Venue => "venue",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "attendee" => Ok(Role::Attendee),
            "artist" => Ok(Role::Artist),
            "venue" => Ok(Role::Venue),
            other => Err(ServiceError::validation(format!(
                "Invalid role '{}'. Must be one of: admin, attendee, artist, venue",
                other
            ))),
        }
    }
}

/// Role change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRole {
    pub role: String,
}
