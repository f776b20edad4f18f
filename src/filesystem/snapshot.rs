use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::{Entry, RelativePath};

/// Every entry below `root` at the moment of the scan, ordered by path.
///
/// `skipped` holds paths that exist but could not be recorded. Nothing at or
/// below a skipped path is known, so consumers must not treat it as absent.
#[derive(Debug, Clone)]
pub struct Snapshot {
    root: PathBuf,
    entries: BTreeMap<RelativePath, Entry>,
    skipped: BTreeSet<RelativePath>,
}

impl Snapshot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: BTreeMap::new(),
            skipped: BTreeSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn insert(&mut self, path: RelativePath, entry: Entry) {
        self.entries.insert(path, entry);
    }

    pub fn mark_skipped(&mut self, path: RelativePath) {
        self.skipped.insert(path);
    }

    pub fn get(&self, path: &RelativePath) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &RelativePath) -> bool {
        self.entries.contains_key(path)
    }

    /// Entries in path order. Reversing the iterator yields children before
    /// their parents.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = (&RelativePath, &Entry)> {
        self.entries.iter()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &RelativePath> {
        self.skipped.iter()
    }

    /// True when `path` lies at or below a skipped path.
    pub fn is_shadowed(&self, path: &RelativePath) -> bool {
        self.skipped.iter().any(|skipped| path.starts_with(skipped))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compares paths, kinds, sizes and modification times, ignoring roots.
    pub fn same_entries(&self, other: &Snapshot) -> bool {
        self.entries == other.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_iteration_yields_children_first() {
        let mut snapshot = Snapshot::new("/tree");
        snapshot.insert("dir".into(), Entry::directory());
        snapshot.insert("dir/sub".into(), Entry::directory());
        snapshot.insert("dir/sub/file".into(), Entry::file(1, None));
        snapshot.insert("dir-2".into(), Entry::directory());

        let reversed: Vec<String> = snapshot
            .entries()
            .rev()
            .map(|(path, _)| path.to_string())
            .collect();
        assert_eq!(reversed, vec!["dir-2", "dir/sub/file", "dir/sub", "dir"]);
    }

    #[test]
    fn test_is_shadowed_covers_descendants() {
        let mut snapshot = Snapshot::new("/tree");
        snapshot.mark_skipped("locked".into());

        assert!(snapshot.is_shadowed(&"locked".into()));
        assert!(snapshot.is_shadowed(&"locked/inner.txt".into()));
        assert!(!snapshot.is_shadowed(&"locked-not".into()));
        assert!(!snapshot.is_shadowed(&"other".into()));
        assert_eq!(snapshot.skipped().count(), 1);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_same_entries_ignores_root() {
        let mut left = Snapshot::new("/left");
        let mut right = Snapshot::new("/right");
        left.insert("a.txt".into(), Entry::file(3, None));
        right.insert("a.txt".into(), Entry::file(3, None));
        assert!(left.same_entries(&right));

        right.insert("b.txt".into(), Entry::file(0, None));
        assert!(!left.same_entries(&right));
    }
}
