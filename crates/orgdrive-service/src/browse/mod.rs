//! Authorized directory browsing and downloads.

pub mod service;

pub use service::{BrowseItem, BrowseService, Listing};
