//! Upload ingestion.

pub mod service;

pub use service::UploadIngestor;
