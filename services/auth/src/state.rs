//! Application state shared across handlers

use crate::session::SessionAuthority;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub authority: SessionAuthority,
}
