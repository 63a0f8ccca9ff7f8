//! Authentication service models

pub mod session;
pub mod user;

// Re-export for convenience
pub use session::{NewSession, Session, SessionState, TokenResult};
pub use user::{NewUser, User};
