//! Storage layer
//!
//! Optional per-table record files mirrored from the catalog

mod record_manager;

pub use record_manager::RecordManager;
