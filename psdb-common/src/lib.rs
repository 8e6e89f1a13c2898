//! # PSDB Common Library
//!
//! Shared code for the preset database services:
//! - Common error type
//! - Configuration loading and root folder resolution
//! - Database initialization (canonical, relationship and pending tables)

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
