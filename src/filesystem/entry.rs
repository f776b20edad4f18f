use std::fs::Metadata;
use std::time::SystemTime;

use derive_more::Display;

/// Kind of a filesystem object inside a tree. Links are never followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum EntryKind {
    #[display("file")]
    File,
    #[display("directory")]
    Directory,
    #[display("symlink")]
    Symlink,
    /// Socket, fifo or device node.
    #[display("special file")]
    Special,
}

/// One object inside a tree. Size and modification time are only tracked
/// for regular files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl Entry {
    pub fn file(size: u64, modified: Option<SystemTime>) -> Self {
        Self {
            kind: EntryKind::File,
            size,
            modified,
        }
    }

    pub fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            size: 0,
            modified: None,
        }
    }

    pub fn symlink() -> Self {
        Self {
            kind: EntryKind::Symlink,
            size: 0,
            modified: None,
        }
    }

    pub fn special() -> Self {
        Self {
            kind: EntryKind::Special,
            size: 0,
            modified: None,
        }
    }

    /// Builds an entry from metadata obtained without following links.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            Self::symlink()
        } else if file_type.is_dir() {
            Self::directory()
        } else if file_type.is_file() {
            Self::file(metadata.len(), metadata.modified().ok())
        } else {
            Self::special()
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}
