//! # orgdrive-core
//!
//! Core crate for OrgDrive. Contains the storage gateway trait, configuration
//! schemas, the canonical path type, and the unified error system.
//!
//! This crate has **no** internal dependencies on other OrgDrive crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
pub use types::path::CanonicalPath;
