//! Department alias directory.

use std::collections::HashMap;

use orgdrive_entity::department::Department;

/// Immutable lookup table mapping department aliases to canonical names.
///
/// Built once from the department table at startup and shared process-wide
/// behind an `Arc`; an administrative reload builds a fresh directory and
/// swaps the handle. Never mutated per-request.
#[derive(Debug, Default)]
pub struct DepartmentDirectory {
    /// Lowercased alias (short code, canonical name, legacy name) → canonical name.
    aliases: HashMap<String, String>,
    /// Canonical names in insertion order.
    canonical: Vec<String>,
}

impl DepartmentDirectory {
    /// Build a directory from department rows.
    pub fn new<'a>(departments: impl IntoIterator<Item = &'a Department>) -> Self {
        let mut aliases = HashMap::new();
        let mut canonical = Vec::new();
        for dept in departments {
            let name = dept.canonical_name.clone();
            aliases.insert(dept.short_code.to_lowercase(), name.clone());
            aliases.insert(name.to_lowercase(), name.clone());
            if let Some(legacy) = dept.legacy_name() {
                aliases.insert(legacy.to_lowercase(), name.clone());
            }
            canonical.push(name);
        }
        Self { aliases, canonical }
    }

    /// Resolve a path's first segment to a canonical department name.
    ///
    /// Matching is case-insensitive across the short code, the canonical
    /// name, and the legacy localized name.
    pub fn resolve_alias(&self, segment: &str) -> Option<&str> {
        self.aliases.get(&segment.to_lowercase()).map(String::as_str)
    }

    /// Canonical department folder names.
    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.canonical.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marketing() -> Department {
        Department {
            id: 1,
            canonical_name: "市场部 (MS)".into(),
            short_code: "MS".into(),
        }
    }

    #[test]
    fn test_all_aliases_resolve() {
        let dept = marketing();
        let dir = DepartmentDirectory::new([&dept]);
        assert_eq!(dir.resolve_alias("MS"), Some("市场部 (MS)"));
        assert_eq!(dir.resolve_alias("ms"), Some("市场部 (MS)"));
        assert_eq!(dir.resolve_alias("市场部"), Some("市场部 (MS)"));
        assert_eq!(dir.resolve_alias("市场部 (MS)"), Some("市场部 (MS)"));
        assert_eq!(dir.resolve_alias("HR"), None);
    }
}
