//! Application state shared across handlers

use auth::{AuthConfig, AuthService};
use sqlx::SqlitePool;

use crate::repositories::{
    ArtistRepository, AssociationRepository, AttendeeRepository, EventRepository, TourRepository,
    VenueRepository,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub auth: AuthService,
    pub venues: VenueRepository,
    pub artists: ArtistRepository,
    pub events: EventRepository,
    pub attendees: AttendeeRepository,
    pub tours: TourRepository,
    pub associations: AssociationRepository,
}

impl AppState {
    /// Wire every store onto one pool
    pub fn new(pool: SqlitePool, auth_config: &AuthConfig) -> Self {
        Self {
            auth: AuthService::new(pool.clone(), auth_config),
            venues: VenueRepository::new(pool.clone()),
            artists: ArtistRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            attendees: AttendeeRepository::new(pool.clone()),
            tours: TourRepository::new(pool.clone()),
            associations: AssociationRepository::new(pool.clone()),
            db_pool: pool,
        }
    }
}
