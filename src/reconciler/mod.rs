//! Brings a replica tree in line with a source tree.
//!
//! Planning is a pure function of two snapshots (plus file contents under the
//! checksum comparison). Applying the plan touches only the replica and never
//! stops on a failed operation: every attempt becomes one [`SyncEvent`].

mod apply;
mod compare;
mod event;
mod plan;

pub use apply::{Reconciler, reconcile};
pub use compare::{Comparison, FileFingerprint, FingerprintError};
pub use event::{CycleSummary, EventKind, OperationError, SyncEvent};
pub use plan::{DiffPlan, Operation};
