use std::path::{Path, PathBuf};
use std::time::SystemTime;

use derive_more::Display;
use snafu::Snafu;
use tracing::{error, info};

use super::Operation;
use crate::filesystem::RelativePath;

/// Reported outcome of one mutation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum EventKind {
    #[display("CREATED")]
    Created,
    #[display("COPIED")]
    Copied,
    #[display("OVERWRITTEN")]
    Overwritten,
    #[display("DELETED")]
    Deleted,
    #[display("ERROR")]
    Error,
}

/// One applied operation and how it ended.
#[derive(Debug)]
pub struct SyncEvent {
    timestamp: SystemTime,
    operation: Operation,
    outcome: Result<(), OperationError>,
}

impl SyncEvent {
    pub fn new(operation: Operation, outcome: Result<(), OperationError>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation,
            outcome,
        }
    }

    pub fn kind(&self) -> EventKind {
        if self.outcome.is_err() {
            return EventKind::Error;
        }
        match self.operation {
            Operation::CreateDirectory(_) => EventKind::Created,
            Operation::CopyFile(_) => EventKind::Copied,
            Operation::OverwriteFile(_) => EventKind::Overwritten,
            Operation::ReplaceEntry { .. }
            | Operation::DeleteFile(_)
            | Operation::DeleteDirectory(_) => EventKind::Deleted,
        }
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn path(&self) -> &RelativePath {
        self.operation.path()
    }

    pub fn error(&self) -> Option<&OperationError> {
        self.outcome.as_ref().err()
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    /// Writes the event to the log, naming the affected replica path.
    pub fn log(&self, replica_root: &Path) {
        let target = self.path().under(replica_root);
        match &self.outcome {
            Ok(()) => info!("[ {} ] {}", self.kind(), target.display()),
            Err(err) => error!("[ {} ] {}: {err}", self.kind(), self.operation),
        }
    }
}

/// Counts of the events produced by one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[display(
    "{created} created, {copied} copied, {overwritten} overwritten, {deleted} deleted, {errors} errors"
)]
pub struct CycleSummary {
    pub created: usize,
    pub copied: usize,
    pub overwritten: usize,
    pub deleted: usize,
    pub errors: usize,
}

impl CycleSummary {
    pub fn record(&mut self, event: &SyncEvent) {
        match event.kind() {
            EventKind::Created => self.created += 1,
            EventKind::Copied => self.copied += 1,
            EventKind::Overwritten => self.overwritten += 1,
            EventKind::Deleted => self.deleted += 1,
            EventKind::Error => self.errors += 1,
        }
    }

    pub fn changes(&self) -> usize {
        self.created + self.copied + self.overwritten + self.deleted
    }
}

impl<'a> FromIterator<&'a SyncEvent> for CycleSummary {
    fn from_iter<I: IntoIterator<Item = &'a SyncEvent>>(events: I) -> Self {
        let mut summary = Self::default();
        for event in events {
            summary.record(event);
        }
        summary
    }
}

/// A single replica mutation failed.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum OperationError {
    #[snafu(display("Failed to create directory {}: {source}", path.display()))]
    CreateDirError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to open source file {}: {source}", path.display()))]
    OpenSourceError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to create replica file {}: {source}", path.display()))]
    CreateFileError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to copy {} to {}: {source}", from.display(), to.display()))]
    CopyError {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to set modification time of {}: {source}", path.display()))]
    SetModifiedError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to remove {}: {source}", path.display()))]
    RemoveError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Refusing to open {}: not a regular file", path.display()))]
    NotAFileError { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::EntryKind;
    use rstest::*;
    use std::io;

    fn failure() -> OperationError {
        OperationError::RemoveError {
            path: PathBuf::from("/replica/x"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        }
    }

    #[rstest]
    #[case(Operation::CreateDirectory("d".into()), EventKind::Created)]
    #[case(Operation::CopyFile("f".into()), EventKind::Copied)]
    #[case(Operation::OverwriteFile("f".into()), EventKind::Overwritten)]
    #[case(Operation::DeleteFile("f".into()), EventKind::Deleted)]
    #[case(Operation::DeleteDirectory("d".into()), EventKind::Deleted)]
    #[case(
        Operation::ReplaceEntry { path: "x".into(), kind: EntryKind::Directory },
        EventKind::Deleted
    )]
    fn test_successful_event_kind(#[case] operation: Operation, #[case] expected: EventKind) {
        let event = SyncEvent::new(operation, Ok(()));
        assert_eq!(event.kind(), expected);
        assert!(!event.is_error());
        assert!(event.error().is_none());
    }

    #[test]
    fn test_failed_event_is_error_kind() {
        let event = SyncEvent::new(Operation::DeleteFile("x".into()), Err(failure()));

        assert_eq!(event.kind(), EventKind::Error);
        assert_eq!(event.path(), &RelativePath::from("x"));
        let message = event.error().expect("error missing").to_string();
        assert!(message.contains("/replica/x"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_event_is_stamped_when_created() {
        let before = SystemTime::now();
        let event = SyncEvent::new(Operation::CopyFile("f".into()), Ok(()));

        assert!(event.timestamp() >= before);
        assert!(event.timestamp() <= SystemTime::now());
    }

    #[test]
    fn test_summary_counts_by_kind() {
        let events = vec![
            SyncEvent::new(Operation::CreateDirectory("d".into()), Ok(())),
            SyncEvent::new(Operation::CopyFile("d/a".into()), Ok(())),
            SyncEvent::new(Operation::CopyFile("d/b".into()), Ok(())),
            SyncEvent::new(Operation::DeleteFile("c".into()), Err(failure())),
        ];

        let summary: CycleSummary = events.iter().collect();

        assert_eq!(
            summary,
            CycleSummary {
                created: 1,
                copied: 2,
                overwritten: 0,
                deleted: 0,
                errors: 1,
            }
        );
        assert_eq!(summary.changes(), 3);
        assert_eq!(
            summary.to_string(),
            "1 created, 2 copied, 0 overwritten, 0 deleted, 1 errors"
        );
    }
}
