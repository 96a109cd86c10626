//! Grant administration.

pub mod service;

pub use service::GrantService;
