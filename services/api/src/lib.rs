//! Events backend HTTP service
//!
//! Venues, artists, events, attendees and tours, the links between them, and
//! venue ratings, served over a thin axum layer on top of the identity store.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod views;

pub use config::AppConfig;
pub use routes::create_router;
pub use state::AppState;
