//! Application state shared across handlers

use crate::edge::EdgeAuthenticator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub edge: EdgeAuthenticator,
}
