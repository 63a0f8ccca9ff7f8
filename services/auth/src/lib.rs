//! Session authority service
//!
//! Issues, verifies, refreshes and revokes bearer tokens backed by a
//! persistent session store, and periodically purges expired sessions.

pub mod audit;
pub mod config;
pub mod error;
pub mod janitor;
pub mod jwt;
pub mod models;
pub mod password;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod state;
pub mod validation;

pub use error::{AuthError, AuthResult};
pub use session::{SessionAuthority, SessionSettings, normalize_token};
pub use state::AppState;
