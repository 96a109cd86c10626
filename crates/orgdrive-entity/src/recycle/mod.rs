//! Recycle (soft-delete) entries.

pub mod model;

pub use model::{CreateRecycleEntry, RecycleEntry};
