//! Identity store for the events backend
//!
//! Users, hashed credentials, roles and sessions, plus the ownership policy
//! every other store consults before mutating a resource.

pub mod config;
pub mod identity;
pub mod models;
pub mod policy;
pub mod repositories;
pub mod service;
pub mod session;
pub mod validation;

pub use config::AuthConfig;
pub use identity::{Identity, is_admin};
pub use models::Role;
pub use policy::{can_mutate, ensure_admin, ensure_can_mutate};
pub use service::{AuthService, Authenticated};
