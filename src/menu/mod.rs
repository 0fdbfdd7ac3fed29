//! Read-only catalog: menu items and their categories.

pub mod dto;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use repo_types::{Category, MenuItem};
