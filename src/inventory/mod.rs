//! Inventory aggregation model
//!
//! The shared tree every processor writes into and the diff engine
//! reads from, plus the snapshot file round-trip.
//!
//! # Architecture
//!
//! - [`tree`] - `Inventory`, `SiteRecord` and friends, with the
//!   referential write-guard
//! - [`snapshot`] - JSON snapshot load/save

pub mod snapshot;
pub mod tree;

pub use tree::{Inventory, NamespaceSlice, NodeRecord, ObjectRecord, SiteRecord, SiteType};
