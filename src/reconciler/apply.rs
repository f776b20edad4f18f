use std::fs::{self, File, Metadata};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use snafu::ResultExt;
use tracing::{debug, info};

use super::event::{
    CopySnafu, CreateDirSnafu, CreateFileSnafu, NotAFileSnafu, OpenSourceSnafu, RemoveSnafu,
    SetModifiedSnafu,
};
use super::{Comparison, DiffPlan, Operation, OperationError, SyncEvent};
use crate::filesystem::{EntryKind, Snapshot};

/// Computes and applies the operations that make a replica match a source.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    comparison: Comparison,
    cancel: Option<Arc<AtomicBool>>,
}

/// Reconciles with the default metadata comparison and no cancellation.
pub fn reconcile(source: &Snapshot, replica: &Snapshot, replica_root: &Path) -> Vec<SyncEvent> {
    Reconciler::default().reconcile(source, replica, replica_root)
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = comparison;
        self
    }

    /// Once the flag is raised no further operation is started. An operation
    /// already running always finishes.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|cancel| cancel.load(Ordering::SeqCst))
    }

    pub fn reconcile(
        &self,
        source: &Snapshot,
        replica: &Snapshot,
        replica_root: &Path,
    ) -> Vec<SyncEvent> {
        let plan = DiffPlan::build(source, replica, self.comparison);
        debug!("Planned {} operations", plan.len());
        self.apply(plan, source.root(), replica_root)
    }

    /// Applies every operation in order, turning each outcome into an event.
    pub fn apply(&self, plan: DiffPlan, source_root: &Path, replica_root: &Path) -> Vec<SyncEvent> {
        let mut events = Vec::with_capacity(plan.len());
        let total = plan.len();

        for operation in plan {
            if self.is_cancelled() {
                info!(
                    "Reconciliation cancelled after {} of {} operations",
                    events.len(),
                    total
                );
                break;
            }
            let outcome = apply_operation(&operation, source_root, replica_root);
            events.push(SyncEvent::new(operation, outcome));
        }

        events
    }
}

fn apply_operation(
    operation: &Operation,
    source_root: &Path,
    replica_root: &Path,
) -> Result<(), OperationError> {
    let target = operation.path().under(replica_root);
    match operation {
        Operation::CreateDirectory(_) => {
            fs::create_dir(&target).context(CreateDirSnafu { path: &target })
        }
        Operation::CopyFile(path) | Operation::OverwriteFile(path) => {
            copy_file(&path.under(source_root), &target)
        }
        Operation::ReplaceEntry {
            kind: EntryKind::Directory,
            ..
        } => fs::remove_dir_all(&target).context(RemoveSnafu { path: &target }),
        Operation::ReplaceEntry { .. } | Operation::DeleteFile(_) => {
            fs::remove_file(&target).context(RemoveSnafu { path: &target })
        }
        Operation::DeleteDirectory(_) => {
            fs::remove_dir(&target).context(RemoveSnafu { path: &target })
        }
    }
}

/// Copies the bytes of `from` over `to` and stamps `to` with the source's
/// modification time. Permission bits are left at the replica's defaults.
fn copy_file(from: &Path, to: &Path) -> Result<(), OperationError> {
    regular_file_metadata(from)?;
    let mut reader = File::open(from).context(OpenSourceSnafu { path: from })?;
    if let Some(existing) = regular_file_metadata(to)? {
        if existing.permissions().readonly() {
            debug!("Removing read-only {} before overwriting", to.display());
            fs::remove_file(to).context(RemoveSnafu { path: to })?;
        }
    }
    let modified = reader.metadata().and_then(|metadata| metadata.modified());
    let mut writer = File::create(to).context(CreateFileSnafu { path: to })?;
    io::copy(&mut reader, &mut writer).context(CopySnafu { from, to })?;

    match modified {
        Ok(modified) => writer
            .set_modified(modified)
            .context(SetModifiedSnafu { path: to }),
        Err(err) => {
            debug!("No modification time for {}: {err}", from.display());
            Ok(())
        }
    }
}

/// Metadata of `path` when it is a regular file, `None` when it cannot be
/// read. Opening a fifo blocks until the other end shows up, so anything
/// else present at `path` is an error.
fn regular_file_metadata(path: &Path) -> Result<Option<Metadata>, OperationError> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if !metadata.is_file() => NotAFileSnafu { path }.fail(),
        Ok(metadata) => Ok(Some(metadata)),
        Err(_) => Ok(None),
    }
}
