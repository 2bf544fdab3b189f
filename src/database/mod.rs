//! Database Module
//!
//! # Module Structure
//! - `core`: `Database` handle, open/execute/save

pub mod core;

// Re-export main types
pub use self::core::Database;
