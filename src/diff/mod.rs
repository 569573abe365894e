//! Snapshot comparison engine
//!
//! Three stages turn two inventory snapshots into a reviewable change
//! list:
//!
//! - [`engine`] - raw structural diff of two site records
//! - [`paths`] - reconstruction of flattened, filtered change paths
//! - [`resolve`] - resolution of each path to the value the old tree
//!   held there
//!
//! The engine never mutates a tree; it reads two independently loaded
//! snapshots.

pub mod engine;
pub mod paths;
pub mod resolve;

use crate::inventory::SiteRecord;
use anyhow::Result;

/// One reconstructed change: the path plus its old-tree resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub path: String,
    pub values: Vec<serde_json::Value>,
}

/// Compare two site records into the flattened change list.
///
/// `None` means the records are not comparable (different, non-migration
/// kinds) or deeply equal - in either case there is nothing to show.
pub fn compare_sites(old: &SiteRecord, new: &SiteRecord) -> Result<Option<Vec<Change>>> {
    if !engine::comparable_kinds(&old.kind, &new.kind) {
        tracing::info!(
            "sites of kind {} and {} cannot be compared",
            old.kind,
            new.kind
        );
        return Ok(None);
    }

    let old_value = serde_json::to_value(old)?;
    let new_value = serde_json::to_value(new)?;
    let Some(diff) = engine::diff_values(&old_value, &new_value) else {
        // Deeply equal records diff to an empty change list
        return Ok(Some(Vec::new()));
    };

    let changes = paths::reconstruct_paths(&diff, &old_value)
        .into_iter()
        .map(|path| {
            let values = resolve::resolve_path(&old_value, &path);
            Change { path, values }
        })
        .collect();

    Ok(Some(changes))
}
