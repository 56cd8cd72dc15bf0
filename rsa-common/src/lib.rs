//! # RSA Common Library
//!
//! Shared code for the review sentiment demo services:
//! - Error types
//! - Configuration loading and root folder resolution
//! - SQLite settings storage (key-value)
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
