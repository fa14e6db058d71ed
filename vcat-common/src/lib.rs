//! # VCAT Common Library
//!
//! Shared code for the VCAT services including:
//! - Catalog models and database queries
//! - SQLite schema initialization
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use config::Config;
pub use error::{Error, Result};
