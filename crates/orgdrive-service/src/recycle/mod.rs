//! Reversible deletion via the quarantine area.

pub mod service;

pub use service::RecycleService;
