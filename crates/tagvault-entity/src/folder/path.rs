//! Helpers for `/`-delimited logical folder paths.
//!
//! A logical path is ancestor-closed: every prefix up to the last `/`
//! names another folder, and a folder's path is always its parent's
//! path plus `/` plus its name.

/// Join a parent path and a child name.
pub fn join(parent: &str, name: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), name)
}

/// Path of the immediate parent, or `None` for a top-level path.
pub fn parent(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) | None => None,
        Some(idx) => Some(&path[..idx]),
    }
}

/// Last segment of a path.
pub fn name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Number of non-empty segments.
pub fn depth(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

/// Whether `path` is `ancestor` itself or lies beneath it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    let ancestor = ancestor.trim_end_matches('/');
    path == ancestor
        || (path.starts_with(ancestor) && path[ancestor.len()..].starts_with('/'))
}

/// Substitute `old_prefix` with `new_prefix` when `path` lies within it.
pub fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if !is_within(path, old_prefix) {
        return None;
    }
    let rest = &path[old_prefix.trim_end_matches('/').len()..];
    Some(format!("{}{}", new_prefix.trim_end_matches('/'), rest))
}

/// Whether `name` can be used as a single path segment.
pub fn is_valid_segment(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_and_name() {
        assert_eq!(parent("/root/a/b"), Some("/root/a"));
        assert_eq!(parent("/root"), None);
        assert_eq!(name("/root/a/b"), "b");
        assert_eq!(join("/root/a", "b"), "/root/a/b");
    }

    #[test]
    fn test_depth_counts_segments() {
        assert_eq!(depth("/root"), 1);
        assert_eq!(depth("/root/photos/2023"), 3);
    }

    #[test]
    fn test_is_within_respects_segment_boundary() {
        assert!(is_within("/root/a", "/root/a"));
        assert!(is_within("/root/a/b", "/root/a"));
        assert!(!is_within("/root/ab", "/root/a"));
    }

    #[test]
    fn test_rebase() {
        assert_eq!(
            rebase("/root/A/B", "/root/A", "/root/A2"),
            Some("/root/A2/B".to_string())
        );
        assert_eq!(rebase("/root/A", "/root/A", "/root/A2"), Some("/root/A2".to_string()));
        assert_eq!(rebase("/root/AB", "/root/A", "/root/A2"), None);
    }

    #[test]
    fn test_segment_validation() {
        assert!(is_valid_segment("holiday 2023"));
        assert!(!is_valid_segment(""));
        assert!(!is_valid_segment(".."));
        assert!(!is_valid_segment("a/b"));
    }
}
