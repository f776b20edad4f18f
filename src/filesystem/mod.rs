//! Point-in-time snapshots of directory trees.
//!
//! A [`Snapshot`] is a flat, path-ordered map of every entry below a root.
//! Ordering is segment-wise, so a directory always precedes its descendants
//! and every subtree occupies a contiguous range of the map.

mod entry;
mod relative_path;
mod snapshot;
mod walker;

pub use entry::{Entry, EntryKind};
pub use relative_path::RelativePath;
pub use snapshot::Snapshot;
pub use walker::{AccessError, ScanError, ScanOutcome, SpecialPolicy, Walker, scan};
