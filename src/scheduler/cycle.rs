use std::fs;
use std::path::{Path, PathBuf};

use snafu::{ResultExt, Snafu, ensure};
use tracing::{debug, info, warn};

use crate::filesystem::{AccessError, SpecialPolicy, Walker};
use crate::reconciler::{CycleSummary, Reconciler};

/// One scan-and-reconcile pass over a source and replica pair.
#[derive(Debug, Clone)]
pub struct Cycle {
    source: PathBuf,
    replica: PathBuf,
    reconciler: Reconciler,
}

impl Cycle {
    pub fn new(source: PathBuf, replica: PathBuf, reconciler: Reconciler) -> Self {
        Self {
            source,
            replica,
            reconciler,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn replica(&self) -> &Path {
        &self.replica
    }

    pub fn run(&self) -> Result<CycleSummary, CycleError> {
        self.ensure_disjoint_trees()?;
        self.ensure_replica_root()?;

        let source = Walker::new()
            .scan(&self.source)
            .context(SourceScanSnafu)?;
        let replica = Walker::new()
            .with_specials(SpecialPolicy::Record)
            .scan(&self.replica)
            .context(ReplicaScanSnafu)?;

        for error in source.errors.iter().chain(replica.errors.iter()) {
            warn!("{error}");
        }

        let events = self
            .reconciler
            .reconcile(&source.snapshot, &replica.snapshot, &self.replica);
        for event in &events {
            event.log(&self.replica);
        }

        let summary: CycleSummary = events.iter().collect();
        if summary.changes() == 0 && summary.errors == 0 {
            debug!("Replica {} is up to date", self.replica.display());
        } else {
            info!("Cycle finished: {summary}");
        }
        Ok(summary)
    }

    fn ensure_replica_root(&self) -> Result<(), CycleError> {
        if fs::symlink_metadata(&self.replica).is_err() {
            info!("Creating replica root {}", self.replica.display());
            fs::create_dir_all(&self.replica).context(CreateReplicaRootSnafu {
                path: &self.replica,
            })?;
        }
        Ok(())
    }

    /// A replica nested in the source, or the other way round, would copy
    /// itself into itself on every cycle.
    fn ensure_disjoint_trees(&self) -> Result<(), CycleError> {
        let (Ok(source_root), Some(replica_root)) =
            (self.source.canonicalize(), canonicalize_partial(&self.replica))
        else {
            // Left for the scan to report.
            return Ok(());
        };
        ensure!(
            !source_root.starts_with(&replica_root) && !replica_root.starts_with(&source_root),
            OverlappingTreesSnafu {
                source_root,
                replica_root
            }
        );
        Ok(())
    }
}

/// Canonical form of `path`, which may not exist yet: its nearest existing
/// ancestor is canonicalized and the missing tail appended.
fn canonicalize_partial(path: &Path) -> Option<PathBuf> {
    let absolute = std::path::absolute(path).ok()?;
    absolute.ancestors().find_map(|ancestor| {
        let resolved = ancestor.canonicalize().ok()?;
        let tail = absolute.strip_prefix(ancestor).ok()?;
        Some(resolved.join(tail))
    })
}

#[derive(Debug, Snafu)]
pub enum CycleError {
    #[snafu(display("Failed to create replica root {}", path.display()))]
    CreateReplicaRootError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "Source {} and replica {} overlap",
        source_root.display(),
        replica_root.display()
    ))]
    OverlappingTrees {
        source_root: PathBuf,
        replica_root: PathBuf,
    },
    #[snafu(display("Cannot scan the source tree"))]
    SourceScanError { source: AccessError },
    #[snafu(display("Cannot scan the replica tree"))]
    ReplicaScanError { source: AccessError },
}
