//! # festsync common library
//!
//! Shared code for the festsync workspace:
//! - Error type used by the store layer
//! - Configuration loading and root folder resolution
//! - Tracing subscriber setup
//! - SQLite database initialization

pub mod config;
pub mod db;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
