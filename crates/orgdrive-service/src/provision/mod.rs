//! Department and personal-folder provisioning.

pub mod service;

pub use service::ProvisionService;
