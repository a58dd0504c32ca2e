//! core::naming
//!
//! Ref naming rules: mapping a git ref to the directory it publishes under.
//!
//! # Rules
//!
//! - `refs/tags/<rest>` is a [`RefKind::Tag`] named after `<rest>`
//! - `refs/heads/<rest>` is a [`RefKind::Branch`] named after `<rest>`
//! - anything else is [`RefKind::Unknown`] and named after the whole string
//!
//! The only normalization is [`slugify`]: path separators become hyphens.
//! Everything else passes through, so the result is trusted as a single
//! path segment and nothing more.

use super::types::{RefIdentity, RefKind, TypeError};

/// Prefix of fully-qualified tag refs.
pub const TAG_PREFIX: &str = "refs/tags/";

/// Prefix of fully-qualified branch refs.
pub const BRANCH_PREFIX: &str = "refs/heads/";

/// File name of the versions manifest at a publish target's root.
pub const MANIFEST_FILE_NAME: &str = "versions.json";

/// Names that already mean something at a publish target's root. Compared
/// ASCII case-insensitively, since targets may live on such filesystems.
pub const RESERVED_NAMES: [&str; 2] = [".git", MANIFEST_FILE_NAME];

/// Replace every path separator with a hyphen.
///
/// # Example
///
/// ```
/// use refpages::core::naming::slugify;
///
/// assert_eq!(slugify("feature/docs"), "feature-docs");
/// assert_eq!(slugify("release\\1.x"), "release-1.x");
/// assert_eq!(slugify("v1.0"), "v1.0");
/// ```
pub fn slugify(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect()
}

/// Resolve a raw ref string into the identity it publishes under.
///
/// # Errors
///
/// Returns `TypeError::InvalidRef` when the slug is empty, a reserved path
/// segment (`.` or `..`), or one of [`RESERVED_NAMES`].
///
/// # Example
///
/// ```
/// use refpages::core::naming::resolve_ref;
/// use refpages::core::types::RefKind;
///
/// let id = resolve_ref("refs/heads/feature/login").unwrap();
/// assert_eq!(id.name(), "feature-login");
/// assert_eq!(id.kind(), RefKind::Branch);
///
/// assert!(resolve_ref("refs/tags/").is_err());
/// assert!(resolve_ref("refs/heads/.git").is_err());
/// ```
pub fn resolve_ref(raw: &str) -> Result<RefIdentity, TypeError> {
    let (rest, kind) = if let Some(rest) = raw.strip_prefix(TAG_PREFIX) {
        (rest, RefKind::Tag)
    } else if let Some(rest) = raw.strip_prefix(BRANCH_PREFIX) {
        (rest, RefKind::Branch)
    } else {
        (raw, RefKind::Unknown)
    };

    RefIdentity::new(slugify(rest), kind, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_replaces_separators_only() {
        assert_eq!(slugify("a/b/c"), "a-b-c");
        assert_eq!(slugify("a\\b"), "a-b");
        assert_eq!(slugify("Fix bug [WIP]"), "Fix bug [WIP]");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn resolve_tag() {
        let id = resolve_ref("refs/tags/v1.0.0").unwrap();
        assert_eq!(id.name(), "v1.0.0");
        assert_eq!(id.kind(), RefKind::Tag);
        assert_eq!(id.raw(), "refs/tags/v1.0.0");
    }

    #[test]
    fn resolve_nested_branch() {
        let id = resolve_ref("refs/heads/release/2.x").unwrap();
        assert_eq!(id.name(), "release-2.x");
        assert_eq!(id.kind(), RefKind::Branch);
    }

    #[test]
    fn resolve_unknown_keeps_whole_string() {
        let id = resolve_ref("refs/remotes/origin/main").unwrap();
        assert_eq!(id.name(), "refs-remotes-origin-main");
        assert_eq!(id.kind(), RefKind::Unknown);

        let id = resolve_ref("v2").unwrap();
        assert_eq!(id.name(), "v2");
        assert_eq!(id.kind(), RefKind::Unknown);
    }

    #[test]
    fn resolve_empty_fails() {
        assert!(resolve_ref("").is_err());
        assert!(resolve_ref("refs/tags/").is_err());
        assert!(resolve_ref("refs/heads/").is_err());
    }

    #[test]
    fn resolve_reserved_segments_fail() {
        assert!(resolve_ref(".").is_err());
        assert!(resolve_ref("refs/heads/..").is_err());
        assert!(resolve_ref("refs/tags/.").is_err());
    }

    #[test]
    fn resolve_reserved_names_fail() {
        for raw in ["refs/tags/.git", "refs/heads/.GIT", ".git", "refs/tags/versions.json"] {
            assert!(
                matches!(resolve_ref(raw), Err(TypeError::InvalidRef { .. })),
                "{raw} should be rejected"
            );
        }
        // Only the whole name is reserved
        assert_eq!(resolve_ref("refs/heads/x/.git").unwrap().name(), "x-.git");
    }

    #[test]
    fn prefix_must_be_exact() {
        // "refs/tagsfoo" is not a tag ref
        let id = resolve_ref("refs/tagsfoo").unwrap();
        assert_eq!(id.kind(), RefKind::Unknown);
        assert_eq!(id.name(), "refs-tagsfoo");
    }
}
