//! Creating, listing, and revoking explicit grants.

use std::sync::Arc;

use tracing::info;

use orgdrive_auth::normalizer::PathNormalizer;
use orgdrive_core::error::AppError;
use orgdrive_core::result::AppResult;
use orgdrive_database::repositories::grant::GrantRepository;
use orgdrive_database::repositories::user::UserRepository;
use orgdrive_entity::grant::{CreateGrant, Grant};
use orgdrive_entity::user::{Role, User};

use crate::context::RequestContext;

/// Administers the grant table. Grants are stored normalized at creation
/// time so policy evaluation never re-resolves aliases; expired grants stay
/// on record until explicitly revoked here.
#[derive(Debug, Clone)]
pub struct GrantService {
    /// Grant repository.
    grants: Arc<GrantRepository>,
    /// User repository (for target lookups).
    users: Arc<UserRepository>,
    /// Path normalizer.
    normalizer: Arc<PathNormalizer>,
}

impl GrantService {
    /// Creates a new grant service.
    pub fn new(
        grants: Arc<GrantRepository>,
        users: Arc<UserRepository>,
        normalizer: Arc<PathNormalizer>,
    ) -> Self {
        Self {
            grants,
            users,
            normalizer,
        }
    }

    /// Grant a user access to a folder. The folder path is normalized
    /// before storage.
    pub async fn create(&self, ctx: &RequestContext, req: CreateGrant) -> AppResult<Grant> {
        let target = self.require_target(ctx, req.user_id).await?;

        let folder_path = self.normalizer.normalize(&req.folder_path);
        if folder_path.is_root() {
            return Err(AppError::validation("Cannot grant access to the storage root"));
        }

        let grant = self
            .grants
            .create(CreateGrant {
                folder_path: folder_path.as_str().to_string(),
                ..req
            })
            .await?;

        info!(
            grant_id = grant.id,
            user = %target.username,
            folder = %grant.folder_path,
            access = %grant.access,
            "Grant created"
        );
        Ok(grant)
    }

    /// List a user's grants, expired ones included.
    pub async fn list_for_user(&self, ctx: &RequestContext, user_id: i64) -> AppResult<Vec<Grant>> {
        self.require_target(ctx, user_id).await?;
        self.grants.find_for_user(user_id).await
    }

    /// Revoke a grant. Deletion is the only way an expired grant leaves
    /// the table.
    pub async fn revoke(&self, ctx: &RequestContext, grant_id: i64) -> AppResult<()> {
        let grant = self
            .grants
            .find_by_id(grant_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Grant {grant_id} not found")))?;
        self.require_target(ctx, grant.user_id).await?;

        self.grants.delete(grant_id).await?;
        info!(grant_id, "Grant revoked");
        Ok(())
    }

    /// Look up the target user and verify the caller may manage their
    /// grants: admins always, leads only within their own department.
    async fn require_target(&self, ctx: &RequestContext, user_id: i64) -> AppResult<User> {
        let target = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;

        let allowed = match ctx.user.role {
            Role::Admin => true,
            Role::Lead => {
                ctx.user.department_id.is_some()
                    && ctx.user.department_id == target.department_id
            }
            Role::Member => false,
        };
        if !allowed {
            return Err(AppError::denied(format!(
                "Not allowed to manage grants for user {user_id}"
            )));
        }
        Ok(target)
    }
}
