//! Shared domain-neutral types.

pub mod path;
