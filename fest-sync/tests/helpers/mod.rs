//! Test Helper Utilities
//!
//! Shared fixtures and database helpers for fest-sync integration tests

#![allow(dead_code)]

pub mod db_utils;
pub mod fixtures;

pub use db_utils::{count_rows, create_test_store, reopen_store};
pub use fixtures::{at, event, event_at_venue, event_with_fine_times, venue};
