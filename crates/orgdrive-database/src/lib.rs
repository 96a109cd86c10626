//! # orgdrive-database
//!
//! SQLite connection management, schema migrations, and repository
//! implementations for OrgDrive.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
