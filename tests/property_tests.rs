//! Property-based tests for ref naming and tree publishing.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::fs;

use proptest::prelude::*;
use tempfile::TempDir;

use refpages::core::naming::{resolve_ref, slugify, BRANCH_PREFIX, RESERVED_NAMES, TAG_PREFIX};
use refpages::core::types::{RefKind, TreeDigest};
use refpages::engine::publish_tree;

/// Strategy for ref suffix characters, separators included.
fn ref_char() -> impl Strategy<Value = char> {
    prop_oneof![
        prop::char::range('a', 'z'),
        prop::char::range('A', 'Z'),
        prop::char::range('0', '9'),
        Just('-'),
        Just('_'),
        Just('.'),
        Just('/'),
        Just('\\'),
    ]
}

fn is_reserved(name: &str) -> bool {
    name == "." || name == ".." || RESERVED_NAMES.iter().any(|r| name.eq_ignore_ascii_case(r))
}

/// Strategy for ref suffixes whose slug is a usable directory name.
fn ref_suffix() -> impl Strategy<Value = String> {
    prop::collection::vec(ref_char(), 1..40).prop_filter_map("reserved slug", |chars| {
        let suffix: String = chars.into_iter().collect();
        (!is_reserved(&slugify(&suffix))).then_some(suffix)
    })
}

proptest! {
    #[test]
    fn tags_resolve_to_slugged_suffix(suffix in ref_suffix()) {
        let raw = format!("{TAG_PREFIX}{suffix}");
        let id = resolve_ref(&raw).unwrap();

        prop_assert_eq!(id.kind(), RefKind::Tag);
        prop_assert_eq!(id.name(), slugify(&suffix));
        prop_assert_eq!(id.raw(), raw.as_str());
    }

    #[test]
    fn branches_resolve_to_slugged_suffix(suffix in ref_suffix()) {
        let id = resolve_ref(&format!("{BRANCH_PREFIX}{suffix}")).unwrap();

        prop_assert_eq!(id.kind(), RefKind::Branch);
        prop_assert_eq!(id.name(), slugify(&suffix));
    }

    #[test]
    fn names_are_single_path_segments(raw in "[a-z/\\\\.]{1,30}") {
        if let Ok(id) = resolve_ref(&raw) {
            let name = id.name();
            prop_assert!(!name.is_empty());
            prop_assert!(!name.contains('/') && !name.contains('\\'));
            prop_assert!(!is_reserved(name));
        }
    }

    #[test]
    fn unprefixed_refs_are_unknown(raw in "[a-z][a-z0-9._-]{0,20}") {
        prop_assume!(!is_reserved(&raw));
        let id = resolve_ref(&raw).unwrap();
        prop_assert_eq!(id.kind(), RefKind::Unknown);
        prop_assert_eq!(id.name(), raw.as_str());
    }

    #[test]
    fn slugify_preserves_length_and_is_idempotent(value in ".{0,40}") {
        let once = slugify(&value);
        prop_assert_eq!(once.chars().count(), value.chars().count());
        prop_assert_eq!(slugify(&once), once.clone());
    }

    #[test]
    fn republishing_is_byte_identical(
        files in prop::collection::btree_map("[a-z]{1,8}", prop::collection::vec(any::<u8>(), 0..64), 1..6)
    ) {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        for (name, bytes) in &files {
            fs::write(src.join(format!("{name}.html")), bytes).unwrap();
        }
        let target = temp.path().join("site");

        let first = publish_tree(&src, &target, "main").unwrap();
        let once = TreeDigest::of_dir(&first.destination).unwrap();
        publish_tree(&src, &target, "main").unwrap();
        let twice = TreeDigest::of_dir(&target.join("main")).unwrap();

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once, TreeDigest::of_dir(&src).unwrap());
        prop_assert_eq!(first.files, files.len());
    }
}

#[test]
fn empty_refs_are_invalid() {
    assert!(resolve_ref("").is_err());
    assert!(resolve_ref(TAG_PREFIX).is_err());
    assert!(resolve_ref(BRANCH_PREFIX).is_err());
}
