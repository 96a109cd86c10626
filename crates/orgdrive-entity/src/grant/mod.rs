//! Explicit permission grants.

pub mod model;

pub use model::{AccessLevel, CreateGrant, Grant};
