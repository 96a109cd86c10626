//! Logical path normalization.

use std::sync::Arc;

use orgdrive_core::types::path::CanonicalPath;
use orgdrive_entity::user::MEMBERS_BUCKET;

use crate::directory::DepartmentDirectory;

/// Resolves logical, alias-bearing paths into canonical
/// storage-relative paths.
///
/// Case is normalized only at the first segment (alias resolution); deeper
/// segments retain caller casing because filenames are case-sensitive on
/// the backing store.
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    directory: Arc<DepartmentDirectory>,
}

impl PathNormalizer {
    /// Create a normalizer over the given alias directory.
    pub fn new(directory: Arc<DepartmentDirectory>) -> Self {
        Self { directory }
    }

    /// Normalize a raw logical path.
    ///
    /// Never fails for malformed input; an unresolvable first segment is
    /// passed through literally and will simply match no department or
    /// grant during authorization.
    pub fn normalize(&self, raw: &str) -> CanonicalPath {
        let parsed = CanonicalPath::parse(raw);

        let rewritten_head = {
            let mut segments = parsed.segments();
            segments.next().and_then(|first| {
                if let Some(canonical) = self.directory.resolve_alias(first) {
                    Some(canonical.to_string())
                } else if first.eq_ignore_ascii_case(MEMBERS_BUCKET) && first != MEMBERS_BUCKET {
                    Some(MEMBERS_BUCKET.to_string())
                } else {
                    None
                }
            })
        };

        match rewritten_head {
            Some(head) => {
                let mut segments = parsed.segments();
                segments.next();
                let tail: Vec<&str> = segments.collect();
                CanonicalPath::from_segments(
                    std::iter::once(head.as_str()).chain(tail.into_iter()),
                )
            }
            None => parsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgdrive_entity::department::Department;

    fn normalizer() -> PathNormalizer {
        let departments = vec![
            Department {
                id: 1,
                canonical_name: "市场部 (MS)".into(),
                short_code: "MS".into(),
            },
            Department {
                id: 2,
                canonical_name: "研发部 (RD)".into(),
                short_code: "RD".into(),
            },
        ];
        PathNormalizer::new(Arc::new(DepartmentDirectory::new(departments.iter())))
    }

    #[test]
    fn test_alias_and_canonical_normalize_identically() {
        let n = normalizer();
        for alias in ["MS", "ms", "市场部", "市场部 (MS)"] {
            assert_eq!(
                n.normalize(&format!("{alias}/Reports/q3.pdf")),
                n.normalize("市场部 (MS)/Reports/q3.pdf"),
                "alias {alias} must resolve to the canonical folder"
            );
        }
    }

    #[test]
    fn test_members_bucket_casing() {
        let n = normalizer();
        assert_eq!(n.normalize("members/alice").as_str(), "Members/alice");
        assert_eq!(n.normalize("MEMBERS/alice").as_str(), "Members/alice");
    }

    #[test]
    fn test_deep_segments_keep_caller_casing() {
        let n = normalizer();
        assert_eq!(
            n.normalize("rd/Specs/API.md").as_str(),
            "研发部 (RD)/Specs/API.md"
        );
    }

    #[test]
    fn test_unknown_alias_passes_through() {
        let n = normalizer();
        assert_eq!(n.normalize("Finance/ledger.xlsx").as_str(), "Finance/ledger.xlsx");
        assert_eq!(n.normalize("//").as_str(), "");
    }

    #[test]
    fn test_unicode_input_forms_compare_equal() {
        let n = normalizer();
        // The same visible name typed composed vs decomposed.
        assert_eq!(
            n.normalize("RD/r\u{e9}sum\u{e9}.pdf"),
            n.normalize("RD/re\u{301}sume\u{301}.pdf")
        );
    }
}
