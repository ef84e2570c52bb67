//! Identity store models

pub mod role;
pub mod session;
pub mod user;

// Re-export for convenience
pub use role::{Role, UpdateRole};
pub use session::{Session, SessionToken};
pub use user::{LoginCredentials, NewUser, User, UserPage, UserQuery, UserView};
