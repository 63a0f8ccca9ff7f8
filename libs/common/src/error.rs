//! Custom error types for the common library
//!
//! This module defines the storage error types shared by the authority and
//! the edge layer.

use redis::RedisError;
use sqlx::Error as SqlxError;
use thiserror::Error;
use tokio::time::error::Elapsed;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// A unique constraint rejected the write
    #[error("Database conflict: {0}")]
    Conflict(String),

    /// The store did not answer within the call deadline
    #[error("Database call timed out")]
    Timeout(#[from] Elapsed),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Error type for key-value cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Redis rejected the command or the connection failed
    #[error("Cache backend error: {0}")]
    Backend(#[from] RedisError),

    /// The cache did not answer within the call deadline
    #[error("Cache call timed out")]
    Timeout(#[from] Elapsed),

    /// A stored value could not be interpreted
    #[error("Corrupt cache value for key {key}: {value}")]
    Corrupt { key: String, value: String },
}

/// Type alias for Result with CacheError
pub type CacheResult<T> = Result<T, CacheError>;
