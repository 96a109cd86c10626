//! Department entity.

pub mod model;

pub use model::Department;
