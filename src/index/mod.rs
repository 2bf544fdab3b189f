//! Index layer
//!
//! B+Tree point-lookup indexes over table columns. Indexes live only for
//! the process and are rebuilt from catalog rows on demand.

pub mod btree;
mod manager;

pub use btree::{BPlusTree, BTreeStats, Iter, NodeId, MIN_ORDER};
pub use manager::{IndexManager, RowIndex};
