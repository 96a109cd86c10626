//! Policy evaluation against the grant store.

use std::sync::Arc;

use chrono::Utc;

use orgdrive_core::error::AppError;
use orgdrive_core::result::AppResult;
use orgdrive_core::types::path::CanonicalPath;
use orgdrive_database::repositories::grant::GrantRepository;
use orgdrive_entity::grant::AccessLevel;
use orgdrive_entity::user::User;

use super::rules::{self, EvalInput};

/// Decides whether an identity may access a canonical path at a requested
/// level.
///
/// Pure decision function over the rule chain in [`rules::RULES`]; the only
/// I/O is the grant-table read, performed lazily so the common
/// department-rule case costs no query. Callers act on the boolean; the
/// evaluator itself has no side effects.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    /// Grant repository.
    grants: Arc<GrantRepository>,
}

impl PolicyEvaluator {
    /// Create a new evaluator.
    pub fn new(grants: Arc<GrantRepository>) -> Self {
        Self { grants }
    }

    /// Evaluate the policy. Fail-closed: no matching rule means `false`.
    pub async fn authorize(
        &self,
        user: &User,
        path: &CanonicalPath,
        requested: AccessLevel,
    ) -> AppResult<bool> {
        let now = Utc::now();
        let probe = EvalInput {
            user,
            path,
            requested,
            grants: &[],
            now,
        };
        if let Some(allow) = rules::decide_role_only(&probe) {
            return Ok(allow);
        }

        let grants = self.grants.find_for_user(user.id).await?;
        Ok(rules::decide(&EvalInput {
            grants: &grants,
            ..probe
        }))
    }

    /// Authorize or fail with a `Denied` error.
    pub async fn require(
        &self,
        user: &User,
        path: &CanonicalPath,
        requested: AccessLevel,
    ) -> AppResult<()> {
        if self.authorize(user, path, requested).await? {
            Ok(())
        } else {
            // Denials are expected steady-state outcomes, not faults.
            tracing::debug!(user = %user.username, %path, %requested, "Access denied");
            Err(AppError::denied(format!(
                "No {requested} access to '{path}'"
            )))
        }
    }
}
