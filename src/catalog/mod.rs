//! Catalog: persisted registry of table schemas and rows

mod registry;

pub use registry::TableRegistry;
