use std::fs;
use std::path::{Path, PathBuf};

use snafu::{IntoError, ResultExt, Snafu, ensure};
use tracing::{debug, trace};

use super::{Entry, EntryKind, RelativePath, Snapshot};

/// What the walker does with symbolic links and special files (sockets,
/// fifos, device nodes) found below the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecialPolicy {
    /// Report the entry as a [`ScanError`] and mark its path as skipped.
    #[default]
    Skip,
    /// Record the entry itself without following or opening it.
    Record,
}

/// Result of a scan that reached the root: the snapshot plus every
/// entry-level problem encountered on the way.
#[derive(Debug)]
pub struct ScanOutcome {
    pub snapshot: Snapshot,
    pub errors: Vec<ScanError>,
}

#[derive(Debug, Clone, Default)]
pub struct Walker {
    specials: SpecialPolicy,
}

/// Scans `root` with the default walker.
pub fn scan(root: &Path) -> Result<ScanOutcome, AccessError> {
    Walker::default().scan(root)
}

impl Walker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_specials(mut self, specials: SpecialPolicy) -> Self {
        self.specials = specials;
        self
    }

    /// Walks the tree below `root` without following links.
    ///
    /// Fails only when the root itself cannot be listed. Any descendant that
    /// cannot be read is reported in [`ScanOutcome::errors`] and left out.
    pub fn scan(&self, root: &Path) -> Result<ScanOutcome, AccessError> {
        let metadata = fs::metadata(root).context(RootMetadataSnafu { path: root })?;
        ensure!(metadata.is_dir(), NotADirectorySnafu { path: root });
        let listing = fs::read_dir(root).context(RootListSnafu { path: root })?;

        let mut snapshot = Snapshot::new(root);
        let mut errors = Vec::new();
        let mut pending = Vec::new();
        self.read_listing(
            &RelativePath::root(),
            root,
            listing,
            &mut snapshot,
            &mut errors,
            &mut pending,
        );

        while let Some(dir) = pending.pop() {
            let absolute = dir.under(root);
            match fs::read_dir(&absolute) {
                Ok(listing) => {
                    snapshot.insert(dir.clone(), Entry::directory());
                    self.read_listing(
                        &dir,
                        &absolute,
                        listing,
                        &mut snapshot,
                        &mut errors,
                        &mut pending,
                    );
                }
                Err(source) => {
                    snapshot.mark_skipped(dir);
                    errors.push(ListSnafu { path: absolute }.into_error(source));
                }
            }
        }

        debug!(
            "Scanned {}: {} entries, {} skipped",
            root.display(),
            snapshot.len(),
            errors.len()
        );
        Ok(ScanOutcome { snapshot, errors })
    }

    /// Records the files and links of one listing and queues its directories.
    /// Directories are only inserted once they turn out to be listable.
    fn read_listing(
        &self,
        dir: &RelativePath,
        absolute: &Path,
        listing: fs::ReadDir,
        snapshot: &mut Snapshot,
        errors: &mut Vec<ScanError>,
        pending: &mut Vec<RelativePath>,
    ) {
        for item in listing {
            let item = match item {
                Ok(item) => item,
                Err(source) => {
                    // The rest of this listing is unknown.
                    snapshot.mark_skipped(dir.clone());
                    errors.push(ListSnafu { path: absolute }.into_error(source));
                    break;
                }
            };

            let path = dir.join(item.file_name());
            let metadata = match item.metadata() {
                Ok(metadata) => metadata,
                Err(source) => {
                    snapshot.mark_skipped(path);
                    errors.push(MetadataSnafu { path: item.path() }.into_error(source));
                    continue;
                }
            };

            let entry = Entry::from_metadata(&metadata);
            match (entry.kind, self.specials) {
                (EntryKind::Directory, _) => pending.push(path),
                (EntryKind::File, _) => {
                    trace!("Recorded {path} ({} bytes)", entry.size);
                    snapshot.insert(path, entry);
                }
                (EntryKind::Symlink | EntryKind::Special, SpecialPolicy::Record) => {
                    snapshot.insert(path, entry);
                }
                (EntryKind::Symlink, SpecialPolicy::Skip) => {
                    snapshot.mark_skipped(path);
                    errors.push(SymlinkSkippedSnafu { path: item.path() }.build());
                }
                (EntryKind::Special, SpecialPolicy::Skip) => {
                    snapshot.mark_skipped(path);
                    errors.push(UnsupportedKindSnafu { path: item.path() }.build());
                }
            }
        }
    }
}

/// The root of a tree cannot be scanned at all.
#[derive(Debug, Snafu)]
pub enum AccessError {
    #[snafu(display("Cannot access tree root {}: {source}", path.display()))]
    RootMetadataError {
        source: std::io::Error,
        path: PathBuf,
    },
    #[snafu(display("Tree root {} is not a directory", path.display()))]
    NotADirectory {
        path: PathBuf,
    },
    #[snafu(display("Cannot list tree root {}: {source}", path.display()))]
    RootListError {
        source: std::io::Error,
        path: PathBuf,
    },
}

/// One entry below the root could not be recorded.
#[derive(Debug, Snafu)]
pub enum ScanError {
    #[snafu(display("Cannot list directory {}: {source}", path.display()))]
    ListError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Cannot read metadata of {}: {source}", path.display()))]
    MetadataError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Skipping symbolic link {}", path.display()))]
    SymlinkSkipped { path: PathBuf },
    #[snafu(display("Skipping {}: neither a file nor a directory", path.display()))]
    UnsupportedKind { path: PathBuf },
}
