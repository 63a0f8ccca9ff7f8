//! Persistence seams for the session authority
//!
//! The authority depends only on the [`UserStore`] and [`SessionStore`]
//! traits. PostgreSQL implementations back the running service; the
//! in-memory implementations back tests and local development.

pub mod memory;
pub mod session;
pub mod user;

pub use memory::{MemorySessionStore, MemoryUserStore};
pub use session::{PgSessionStore, SessionStore};
pub use user::{PgUserStore, UserStore};
