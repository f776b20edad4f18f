use derive_more::Display;
use tracing::debug;

use super::Comparison;
use crate::filesystem::{Entry, EntryKind, RelativePath, Snapshot};

/// One filesystem mutation on the replica.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Operation {
    #[display("create directory {_0}")]
    CreateDirectory(RelativePath),
    #[display("copy {_0}")]
    CopyFile(RelativePath),
    #[display("overwrite {_0}")]
    OverwriteFile(RelativePath),
    /// Removes a replica entry whose kind differs from the source's,
    /// recursively when it is a directory.
    #[display("replace {kind} {path}")]
    ReplaceEntry { path: RelativePath, kind: EntryKind },
    #[display("delete {_0}")]
    DeleteFile(RelativePath),
    /// Only succeeds once the directory is empty.
    #[display("delete directory {_0}")]
    DeleteDirectory(RelativePath),
}

impl Operation {
    pub fn path(&self) -> &RelativePath {
        match self {
            Operation::CreateDirectory(path)
            | Operation::CopyFile(path)
            | Operation::OverwriteFile(path)
            | Operation::ReplaceEntry { path, .. }
            | Operation::DeleteFile(path)
            | Operation::DeleteDirectory(path) => path,
        }
    }

    fn create(path: &RelativePath, entry: &Entry) -> Self {
        match entry.kind {
            EntryKind::Directory => Operation::CreateDirectory(path.clone()),
            _ => Operation::CopyFile(path.clone()),
        }
    }

    fn delete(path: &RelativePath, entry: &Entry) -> Self {
        match entry.kind {
            EntryKind::Directory => Operation::DeleteDirectory(path.clone()),
            _ => Operation::DeleteFile(path.clone()),
        }
    }
}

/// Ordered operations that turn the replica into a copy of the source.
///
/// Creations, copies, overwrites and replacements come first in forward path
/// order, so a directory exists before anything is put into it. Deletions
/// follow in reverse path order, so a directory is emptied before removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffPlan {
    operations: Vec<Operation>,
}

impl DiffPlan {
    pub fn build(source: &Snapshot, replica: &Snapshot, comparison: Comparison) -> Self {
        let mut operations = Vec::new();
        // Replica directories removed wholesale by a replacement.
        let mut replaced: Vec<&RelativePath> = Vec::new();

        for (path, source_entry) in source.entries() {
            if !source_entry.is_file() && !source_entry.is_dir() {
                // Links and special files are never copied; whatever the
                // replica holds at this path is left as it is.
                debug!("Not mirroring {} {path}", source_entry.kind);
                continue;
            }
            match replica.get(path) {
                None => operations.push(Operation::create(path, source_entry)),
                Some(replica_entry) if replica_entry.kind != source_entry.kind => {
                    operations.push(Operation::ReplaceEntry {
                        path: path.clone(),
                        kind: replica_entry.kind,
                    });
                    if replica_entry.is_dir() {
                        replaced.push(path);
                    }
                    operations.push(Operation::create(path, source_entry));
                }
                Some(replica_entry) => {
                    if source_entry.is_file()
                        && comparison.differs(
                            source_entry,
                            replica_entry,
                            &path.under(source.root()),
                            &path.under(replica.root()),
                        )
                    {
                        operations.push(Operation::OverwriteFile(path.clone()));
                    }
                }
            }
        }

        for (path, replica_entry) in replica.entries().rev() {
            if source.contains(path) {
                continue;
            }
            if replaced.iter().any(|ancestor| path.starts_with(ancestor)) {
                continue;
            }
            if source.is_shadowed(path) {
                debug!("Keeping {path}: the source side could not be read");
                continue;
            }
            operations.push(Operation::delete(path, replica_entry));
        }

        Self { operations }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl IntoIterator for DiffPlan {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn at(seconds: u64) -> Option<SystemTime> {
        Some(SystemTime::UNIX_EPOCH + Duration::from_secs(seconds))
    }

    fn snapshot(root: &str, entries: &[(&str, Entry)]) -> Snapshot {
        let mut snapshot = Snapshot::new(root);
        for (path, entry) in entries {
            snapshot.insert((*path).into(), entry.clone());
        }
        snapshot
    }

    fn plan(source: &Snapshot, replica: &Snapshot) -> Vec<Operation> {
        DiffPlan::build(source, replica, Comparison::Metadata)
            .into_iter()
            .collect()
    }

    #[test]
    fn test_overwrite_copy_and_delete_scenario() {
        let source = snapshot(
            "/source",
            &[
                ("a.txt", Entry::file(10, at(1))),
                ("dir", Entry::directory()),
                ("dir/b.txt", Entry::file(5, at(1))),
            ],
        );
        let replica = snapshot(
            "/replica",
            &[
                ("a.txt", Entry::file(20, at(1))),
                ("dir", Entry::directory()),
                ("dir/c.txt", Entry::file(3, at(1))),
            ],
        );

        assert_eq!(
            plan(&source, &replica),
            vec![
                Operation::OverwriteFile("a.txt".into()),
                Operation::CopyFile("dir/b.txt".into()),
                Operation::DeleteFile("dir/c.txt".into()),
            ]
        );
    }

    #[test]
    fn test_empty_directory_is_created() {
        let source = snapshot("/source", &[("empty", Entry::directory())]);
        let replica = snapshot("/replica", &[]);

        assert_eq!(
            plan(&source, &replica),
            vec![Operation::CreateDirectory("empty".into())]
        );
    }

    #[test]
    fn test_identical_trees_need_no_operations() {
        let entries = [
            ("a.txt", Entry::file(10, at(7))),
            ("dir", Entry::directory()),
            ("dir/zero", Entry::file(0, at(7))),
        ];
        let source = snapshot("/source", &entries);
        let replica = snapshot("/replica", &entries);

        assert!(DiffPlan::build(&source, &replica, Comparison::Metadata).is_empty());
    }

    #[test]
    fn test_modification_time_change_alone_triggers_overwrite() {
        let source = snapshot("/source", &[("a.txt", Entry::file(10, at(2)))]);
        let replica = snapshot("/replica", &[("a.txt", Entry::file(10, at(1)))]);

        assert_eq!(
            plan(&source, &replica),
            vec![Operation::OverwriteFile("a.txt".into())]
        );
    }

    #[test]
    fn test_creates_run_parents_first() {
        let source = snapshot(
            "/source",
            &[
                ("a", Entry::directory()),
                ("a/b", Entry::directory()),
                ("a/b/c.txt", Entry::file(1, at(1))),
                ("a-file", Entry::file(1, at(1))),
            ],
        );
        let replica = snapshot("/replica", &[]);

        assert_eq!(
            plan(&source, &replica),
            vec![
                Operation::CreateDirectory("a".into()),
                Operation::CreateDirectory("a/b".into()),
                Operation::CopyFile("a/b/c.txt".into()),
                Operation::CopyFile("a-file".into()),
            ]
        );
    }

    #[test]
    fn test_deletes_run_children_first() {
        let source = snapshot("/source", &[]);
        let replica = snapshot(
            "/replica",
            &[
                ("old", Entry::directory()),
                ("old/nested", Entry::directory()),
                ("old/nested/file", Entry::file(1, at(1))),
                ("old/other", Entry::file(1, at(1))),
                ("old.txt", Entry::file(1, at(1))),
            ],
        );

        assert_eq!(
            plan(&source, &replica),
            vec![
                Operation::DeleteFile("old.txt".into()),
                Operation::DeleteFile("old/other".into()),
                Operation::DeleteFile("old/nested/file".into()),
                Operation::DeleteDirectory("old/nested".into()),
                Operation::DeleteDirectory("old".into()),
            ]
        );
    }

    #[test]
    fn test_directory_replaced_by_file_drops_its_descendants() {
        let source = snapshot("/source", &[("thing", Entry::file(4, at(1)))]);
        let replica = snapshot(
            "/replica",
            &[
                ("thing", Entry::directory()),
                ("thing/inner.txt", Entry::file(1, at(1))),
            ],
        );

        assert_eq!(
            plan(&source, &replica),
            vec![
                Operation::ReplaceEntry {
                    path: "thing".into(),
                    kind: EntryKind::Directory,
                },
                Operation::CopyFile("thing".into()),
            ]
        );
    }

    #[test]
    fn test_file_replaced_by_directory_before_children_are_copied() {
        let source = snapshot(
            "/source",
            &[
                ("thing", Entry::directory()),
                ("thing/inner.txt", Entry::file(1, at(1))),
            ],
        );
        let replica = snapshot("/replica", &[("thing", Entry::file(4, at(1)))]);

        assert_eq!(
            plan(&source, &replica),
            vec![
                Operation::ReplaceEntry {
                    path: "thing".into(),
                    kind: EntryKind::File,
                },
                Operation::CreateDirectory("thing".into()),
                Operation::CopyFile("thing/inner.txt".into()),
            ]
        );
    }

    #[test]
    fn test_replica_symlink_is_deleted_or_replaced() {
        let source = snapshot("/source", &[("shadow", Entry::file(1, at(1)))]);
        let replica = snapshot(
            "/replica",
            &[("link", Entry::symlink()), ("shadow", Entry::symlink())],
        );

        assert_eq!(
            plan(&source, &replica),
            vec![
                Operation::ReplaceEntry {
                    path: "shadow".into(),
                    kind: EntryKind::Symlink,
                },
                Operation::CopyFile("shadow".into()),
                Operation::DeleteFile("link".into()),
            ]
        );
    }

    #[test]
    fn test_replica_special_file_is_deleted_or_replaced() {
        let source = snapshot("/source", &[("a.txt", Entry::file(7, at(1)))]);
        let replica = snapshot(
            "/replica",
            &[("a.txt", Entry::special()), ("pipe", Entry::special())],
        );

        assert_eq!(
            plan(&source, &replica),
            vec![
                Operation::ReplaceEntry {
                    path: "a.txt".into(),
                    kind: EntryKind::Special,
                },
                Operation::CopyFile("a.txt".into()),
                Operation::DeleteFile("pipe".into()),
            ]
        );
    }

    #[test]
    fn test_recorded_source_specials_are_never_copied() {
        let source = snapshot(
            "/source",
            &[("link", Entry::symlink()), ("pipe", Entry::special())],
        );
        let replica = snapshot("/replica", &[("pipe", Entry::file(1, at(1)))]);

        assert!(plan(&source, &replica).is_empty());
    }

    #[test]
    fn test_unreadable_source_entries_protect_replica_copies() {
        let mut source = snapshot("/source", &[("ok.txt", Entry::file(1, at(1)))]);
        source.mark_skipped("locked".into());
        source.mark_skipped("secret.txt".into());
        let replica = snapshot(
            "/replica",
            &[
                ("locked", Entry::directory()),
                ("locked/inside.txt", Entry::file(1, at(1))),
                ("ok.txt", Entry::file(1, at(1))),
                ("secret.txt", Entry::file(1, at(1))),
                ("stale.txt", Entry::file(1, at(1))),
            ],
        );

        assert_eq!(
            plan(&source, &replica),
            vec![Operation::DeleteFile("stale.txt".into())]
        );
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(
            Operation::CopyFile("dir/b.txt".into()).to_string(),
            "copy dir/b.txt"
        );
        assert_eq!(
            Operation::ReplaceEntry {
                path: "x".into(),
                kind: EntryKind::Directory,
            }
            .to_string(),
            "replace directory x"
        );
    }
}
