//! Database initialization and listing schema

pub mod init;

pub use init::*;
