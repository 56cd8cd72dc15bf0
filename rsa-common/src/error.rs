//! Errors shared by the settings store and config loading

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Root folder or config file access
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML, or a stored setting that does not parse
    #[error("Configuration error: {0}")]
    Config(String),
}
