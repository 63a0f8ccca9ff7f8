//! Edge gateway: rate limiting and cached token verification in front of
//! the session authority

pub mod client;
pub mod config;
pub mod edge;
pub mod error;
pub mod middleware;
pub mod policy;
pub mod rate_limiter;
pub mod routes;
pub mod state;
pub mod token_cache;

#[cfg(test)]
mod testing;

pub use edge::EdgeAuthenticator;
pub use error::{GatewayError, GatewayResult};
pub use policy::FailurePolicy;
pub use state::AppState;
