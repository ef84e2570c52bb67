//! Database queries for the identity store

pub mod session;
pub mod user;
