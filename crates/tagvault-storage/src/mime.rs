//! Extension-based MIME type guessing.

/// Guess a MIME type from a file name or path extension.
pub fn mime_from_name(name: &str) -> Option<String> {
    mime_guess::from_path(name)
        .first()
        .map(|m| m.essence_str().to_string())
}
