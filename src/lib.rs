//! Client library for the MSU food-ordering app.
//!
//! `auth`, `menu` and `storage` are thin passthroughs to the hosted backend
//! platform behind [`backend::Backend`]. `session` holds what the client
//! believes about the signed-in user and reconciles it with the backend.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod menu;
pub mod session;
pub mod state;
pub mod storage;

pub use error::{BackendError, GatewayError};
pub use session::{Session, SessionStore};
pub use state::AppState;
