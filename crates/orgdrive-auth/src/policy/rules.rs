//! Pure authorization predicates, evaluated in a fixed order.

use chrono::{DateTime, Utc};

use orgdrive_core::types::path::CanonicalPath;
use orgdrive_entity::grant::{AccessLevel, Grant};
use orgdrive_entity::user::{Role, User, MEMBERS_BUCKET};

/// Everything a rule may look at. Rules are pure: no I/O, no clock reads
/// (the expiry check uses the single `now` captured per evaluation).
#[derive(Debug, Clone, Copy)]
pub struct EvalInput<'a> {
    /// The requesting identity.
    pub user: &'a User,
    /// The normalized path being accessed.
    pub path: &'a CanonicalPath,
    /// The requested access level.
    pub requested: AccessLevel,
    /// The user's grants (expired ones included; rules filter).
    pub grants: &'a [Grant],
    /// One consistent timestamp for all expiry checks in this evaluation.
    pub now: DateTime<Utc>,
}

/// A single policy rule. `Some(true)` allows, `None` passes to the next
/// rule. No rule denies outright; exhausting the list denies (fail-closed).
pub type Rule = fn(&EvalInput<'_>) -> Option<bool>;

/// The policy, in precedence order. Department rules run before the grant
/// rule so the common case never touches the grant table.
pub const RULES: &[(&str, Rule)] = &[
    ("admin", admin),
    ("personal_space", personal_space),
    ("department", department),
    ("explicit_grant", explicit_grant),
];

/// Evaluate the full rule chain.
pub fn decide(input: &EvalInput<'_>) -> bool {
    RULES
        .iter()
        .find_map(|(_, rule)| rule(input))
        .unwrap_or(false)
}

/// Evaluate only the role-derived rules (everything ahead of the grant
/// scan). `None` means the caller must load grants and run [`decide`].
pub fn decide_role_only(input: &EvalInput<'_>) -> Option<bool> {
    RULES[..RULES.len() - 1]
        .iter()
        .find_map(|(_, rule)| rule(input))
}

/// Admins may do anything.
fn admin(input: &EvalInput<'_>) -> Option<bool> {
    input.user.is_admin().then_some(true)
}

/// Full access to the caller's own top-level personal folder.
fn personal_space(input: &EvalInput<'_>) -> Option<bool> {
    let prefix = format!("{MEMBERS_BUCKET}/{}", input.user.username);
    input.path.is_within_ci(&prefix).then_some(true)
}

/// Department-derived implicit access.
///
/// Leads get full access to their department tree. Members get read access
/// to it, plus full access to their own legacy in-department personal
/// folder. A Member's write request inside the department falls through to
/// the grant rule, which may elevate.
fn department(input: &EvalInput<'_>) -> Option<bool> {
    let dept = input.user.department_name.as_deref()?;
    if !input.path.is_within_ci(dept) {
        return None;
    }
    match input.user.role {
        Role::Admin | Role::Lead => Some(true),
        Role::Member => {
            let personal = format!("{dept}/{MEMBERS_BUCKET}/{}", input.user.username);
            if input.path.is_within_ci(&personal) {
                return Some(true);
            }
            (input.requested == AccessLevel::Read).then_some(true)
        }
    }
}

/// Explicit grants: most permissive non-expired grant wins. Prefix matching
/// is segment-boundary-safe, so a grant on `Foo` never leaks onto `Foo2`.
fn explicit_grant(input: &EvalInput<'_>) -> Option<bool> {
    input
        .grants
        .iter()
        .filter(|g| !g.is_expired(input.now))
        .filter(|g| input.path.is_within_str(&g.folder_path))
        .any(|g| g.access.satisfies(input.requested))
        .then_some(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(id: i64, username: &str, role: Role, dept: Option<&str>) -> User {
        User {
            id,
            username: username.into(),
            role,
            department_id: dept.map(|_| 1),
            department_name: dept.map(String::from),
            created_at: Utc::now(),
        }
    }

    fn grant(path: &str, access: AccessLevel, expires_at: Option<DateTime<Utc>>) -> Grant {
        Grant {
            id: 1,
            user_id: 1,
            folder_path: path.into(),
            access,
            expires_at,
            created_at: Utc::now(),
        }
    }

    fn check(user: &User, path: &str, requested: AccessLevel, grants: &[Grant]) -> bool {
        let path = CanonicalPath::parse(path);
        decide(&EvalInput {
            user,
            path: &path,
            requested,
            grants,
            now: Utc::now(),
        })
    }

    #[test]
    fn test_rule_order_is_the_documented_precedence() {
        let names: Vec<&str> = RULES.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec!["admin", "personal_space", "department", "explicit_grant"]
        );
    }

    #[test]
    fn test_admin_bypasses_everything() {
        let admin = user(1, "root", Role::Admin, None);
        assert!(check(&admin, "anywhere/at/all", AccessLevel::Full, &[]));
    }

    #[test]
    fn test_member_department_matrix() {
        let member = user(2, "alice", Role::Member, Some("市场部 (MS)"));

        assert!(check(&member, "市场部 (MS)", AccessLevel::Read, &[]));
        assert!(!check(&member, "市场部 (MS)", AccessLevel::Full, &[]));
        assert!(!check(
            &member,
            "市场部 (MS)/Reports",
            AccessLevel::Full,
            &[]
        ));
        assert!(check(
            &member,
            "市场部 (MS)/Members/alice/draft.txt",
            AccessLevel::Full,
            &[]
        ));
        assert!(!check(
            &member,
            "市场部 (MS)/Members/bob",
            AccessLevel::Full,
            &[]
        ));
    }

    #[test]
    fn test_lead_has_full_department_access() {
        let lead = user(3, "dan", Role::Lead, Some("研发部 (RD)"));
        assert!(check(&lead, "研发部 (RD)/Specs", AccessLevel::Full, &[]));
        assert!(!check(&lead, "市场部 (MS)", AccessLevel::Read, &[]));
    }

    #[test]
    fn test_own_personal_space_is_full_others_denied() {
        let member = user(4, "erin", Role::Member, None);
        assert!(check(&member, "Members/erin/notes.txt", AccessLevel::Full, &[]));
        assert!(check(&member, "members/ERIN", AccessLevel::Full, &[]));
        assert!(!check(&member, "Members/frank", AccessLevel::Read, &[]));
    }

    #[test]
    fn test_expired_grant_is_inert() {
        let outsider = user(5, "gail", Role::Member, None);
        let expired = grant(
            "研发部 (RD)/Specs",
            AccessLevel::Read,
            Some(Utc::now() - Duration::minutes(1)),
        );
        assert!(!check(
            &outsider,
            "研发部 (RD)/Specs",
            AccessLevel::Read,
            &[expired]
        ));
    }

    #[test]
    fn test_grant_levels() {
        let outsider = user(6, "hugh", Role::Member, None);
        let read = grant("Shared/Plans", AccessLevel::Read, None);
        assert!(check(&outsider, "Shared/Plans/2026.md", AccessLevel::Read, &[read.clone()]));
        assert!(!check(&outsider, "Shared/Plans/2026.md", AccessLevel::Full, &[read.clone()]));

        // Most permissive wins across overlapping grants.
        let full = grant("Shared/Plans", AccessLevel::Full, None);
        assert!(check(
            &outsider,
            "Shared/Plans/2026.md",
            AccessLevel::Full,
            &[read, full]
        ));
    }

    #[test]
    fn test_grant_prefix_is_boundary_safe() {
        let outsider = user(7, "iris", Role::Member, None);
        let g = grant("Shared/Foo", AccessLevel::Full, None);
        assert!(check(&outsider, "Shared/Foo/x.txt", AccessLevel::Full, &[g.clone()]));
        assert!(!check(&outsider, "Shared/Foo2/x.txt", AccessLevel::Full, &[g]));
    }

    #[test]
    fn test_grant_elevates_member_inside_department() {
        let member = user(8, "jan", Role::Member, Some("市场部 (MS)"));
        let g = grant("市场部 (MS)/Reports", AccessLevel::Full, None);
        assert!(!check(&member, "市场部 (MS)/Reports", AccessLevel::Full, &[]));
        assert!(check(&member, "市场部 (MS)/Reports", AccessLevel::Full, &[g]));
    }

    #[test]
    fn test_default_deny() {
        let nobody = user(9, "kim", Role::Member, None);
        assert!(!check(&nobody, "研发部 (RD)", AccessLevel::Read, &[]));
        assert!(!check(&nobody, "", AccessLevel::Read, &[]));
    }
}
