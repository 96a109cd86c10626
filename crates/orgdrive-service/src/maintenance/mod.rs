//! Operator maintenance passes.

pub mod service;

pub use service::{MaintenanceService, ReconcileReport};
