//! Error types for pairlink-connect

use thiserror::Error;

/// Invalid snap configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be positive")]
    NonPositive { field: &'static str },

    #[error("connector axis must be non-zero")]
    ZeroAxis,
}

/// Connect error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    World(#[from] pairlink_world::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
