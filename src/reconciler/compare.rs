use std::fs::File;
use std::hash::Hasher;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use derive_more::Display;
use metrohash::MetroHash64;
use snafu::{ResultExt, Snafu, ensure};
use tracing::debug;

use crate::filesystem::Entry;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// How two files present on both sides are judged equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum Comparison {
    /// Equal size and modification time.
    #[default]
    #[display("metadata")]
    Metadata,
    /// Equal size and equal content hash. Reads both files.
    #[display("checksum")]
    Checksum,
}

impl Comparison {
    /// Decides whether the replica copy of a file needs to be rewritten.
    pub fn differs(
        &self,
        source: &Entry,
        replica: &Entry,
        source_path: &Path,
        replica_path: &Path,
    ) -> bool {
        if source.size != replica.size {
            return true;
        }
        match self {
            Comparison::Metadata => source.modified != replica.modified,
            Comparison::Checksum => {
                match (
                    FileFingerprint::try_from(source_path),
                    FileFingerprint::try_from(replica_path),
                ) {
                    (Ok(source), Ok(replica)) => source != replica,
                    (Err(error), _) | (_, Err(error)) => {
                        debug!("Treating file as changed: {error}");
                        true
                    }
                }
            }
        }
    }
}

/// Content hash of a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileFingerprint(u64);

impl TryFrom<&Path> for FileFingerprint {
    type Error = FingerprintError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let metadata = path.metadata().context(PathSnafu { path })?;
        ensure!(!metadata.is_dir(), DirectorySnafu { path });

        let mut file = File::open(path).context(PathSnafu { path })?;
        let mut hasher = MetroHash64::default();
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(error).context(PathSnafu { path }),
            };
            hasher.write(&buffer[..read]);
        }

        Ok(FileFingerprint(hasher.finish()))
    }
}

#[derive(Debug, Snafu)]
pub enum FingerprintError {
    #[snafu(display("Failed to fingerprint {}: {source}", path.display()))]
    PathError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("The supplied path {} is a directory", path.display()))]
    DirectoryError { path: PathBuf },
}
