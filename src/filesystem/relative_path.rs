use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// Path of an entry relative to its tree root, stored as individual segments.
///
/// The derived ordering compares segment by segment, which keeps `a/b`
/// between `a` and `a-b`. Plain string ordering would not.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RelativePath(Vec<OsString>);

impl RelativePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn join(&self, segment: impl AsRef<OsStr>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.as_ref().to_os_string());
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `ancestor` is this path or one of its parents.
    pub fn starts_with(&self, ancestor: &RelativePath) -> bool {
        self.0.starts_with(&ancestor.0)
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.0.iter().collect()
    }

    /// Resolves this path against a tree root.
    pub fn under(&self, root: &Path) -> PathBuf {
        root.join(self.to_path_buf())
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        let mut first = true;
        for segment in &self.0 {
            if !first {
                f.write_str("/")?;
            }
            write!(f, "{}", segment.to_string_lossy())?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
impl From<&str> for RelativePath {
    fn from(path: &str) -> Self {
        Self(
            path.split('/')
                .filter(|segment| !segment.is_empty())
                .map(OsString::from)
                .collect(),
        )
    }
}
