//! Account and profile operations against the backend platform.

pub mod dto;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use repo_types::{User, UserDocument};
pub use services::UserLookup;
