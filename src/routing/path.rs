//! Path normalization and joining.
//!
//! # Responsibilities
//! - Normalize registered path fragments to a canonical form
//! - Join router prefixes with relative handler paths
//!
//! # Design Decisions
//! - Canonical form: leading slash, single separators, no trailing
//!   slash except for the root path itself
//! - Case is preserved; matching is the transport's concern

/// Normalize a path fragment: ensure a leading slash, collapse redundant
/// separators and strip the trailing slash (root stays `/`).
pub fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Join path fragments into one normalized path.
pub fn join_paths<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for fragment in fragments {
        for segment in fragment.as_ref().split('/').filter(|segment| !segment.is_empty()) {
            joined.push('/');
            joined.push_str(segment);
        }
    }
    if joined.is_empty() {
        joined.push('/');
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_redundant_slashes() {
        assert_eq!(normalize_path("//users///profile/"), "/users/profile");
        assert_eq!(normalize_path("users"), "/users");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn joins_prefix_and_relative_path() {
        assert_eq!(join_paths(["/api", "/users/"]), "/api/users");
        assert_eq!(join_paths(["/", "/"]), "/");
        assert_eq!(join_paths(["/api/", "//v1//", "items"]), "/api/v1/items");
        assert_eq!(join_paths(["", ""]), "/");
    }
}
