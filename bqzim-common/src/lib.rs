//! # BQ Zim Common Library
//!
//! Shared code for the BQ Zim estimation service:
//! - Error type used across crates
//! - Configuration loading and root folder resolution
//! - Database initialization and schema
//! - User accounts (credential storage and verification)

pub mod config;
pub mod db;
pub mod error;
pub mod password;
pub mod users;

pub use error::{Error, Result};
