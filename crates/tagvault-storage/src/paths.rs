//! Mapping between logical folder paths and physical locations.

use std::path::{Component, Path, PathBuf};

/// Maps `/`-delimited logical paths onto a fixed upload root.
///
/// `/root/photos/2023` maps to `<upload_root>/root/photos/2023`.
#[derive(Debug, Clone)]
pub struct PathMapper {
    upload_root: PathBuf,
}

impl PathMapper {
    /// Create a mapper rooted at `upload_root`.
    pub fn new(upload_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
        }
    }

    /// The fixed physical root.
    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    /// Physical location of a logical path.
    ///
    /// Empty segments are dropped, so malformed input degenerates
    /// towards the upload root instead of failing.
    pub fn to_physical(&self, full_path: &str) -> PathBuf {
        full_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.upload_root.clone(), |path, segment| path.join(segment))
    }

    /// Logical path of a physical location under the upload root.
    ///
    /// Returns `None` when `physical` does not lie under the root or a
    /// component is not valid UTF-8.
    pub fn to_logical(&self, physical: &Path) -> Option<String> {
        let relative = physical.strip_prefix(&self.upload_root).ok()?;
        let mut logical = String::new();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => {
                    logical.push('/');
                    logical.push_str(segment.to_str()?);
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        if logical.is_empty() {
            logical.push('/');
        }
        Some(logical)
    }
}
