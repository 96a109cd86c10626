//! # orgdrive-storage
//!
//! Local filesystem implementation of the [`StorageGateway`] trait, scoped
//! under a single configured storage root.
//!
//! [`StorageGateway`]: orgdrive_core::traits::storage::StorageGateway

pub mod gateway;

pub use gateway::LocalGateway;
