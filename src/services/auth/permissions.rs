use crate::db::repositories::RoleRepository;
use crate::error::AuthError;
use crate::models::{Permission, Role};
use log::debug;

/// Decides whether a principal may perform a (resource, action) pair.
///
/// Evaluation is pure given the role's permission snapshot; nothing is
/// cached. Infrastructure and missing-user failures surface as
/// `LookupFailed`, never as "no permission".
pub struct PermissionService {
    role_repo: RoleRepository,
}

impl PermissionService {
    pub fn new(role_repo: RoleRepository) -> Self {
        Self { role_repo }
    }

    pub async fn has_permission(
        &self,
        user_id: i64,
        resource: &str,
        action: &str,
    ) -> Result<bool, AuthError> {
        let (role, permissions) = self.role_and_permissions_of_user(user_id).await?;

        let allowed = evaluate(&permissions, resource, action);
        debug!(
            "Permission check {}:{} for user {} (role {}): {}",
            resource, action, user_id, role.name, allowed
        );

        Ok(allowed)
    }

    /// Exact role-name equality only.
    pub async fn has_role(&self, user_id: i64, role_name: &str) -> Result<bool, AuthError> {
        let role = self
            .role_repo
            .role_of_user(user_id)
            .await
            .map_err(|e| AuthError::LookupFailed(e.to_string()))?
            .ok_or_else(|| AuthError::LookupFailed(format!("user {} not found", user_id)))?;

        Ok(role.name == role_name)
    }

    /// The role and full permission set of a user, for callers that show
    /// identity rather than gate on it.
    pub async fn role_and_permissions_of_user(
        &self,
        user_id: i64,
    ) -> Result<(Role, Vec<Permission>), AuthError> {
        let role = self
            .role_repo
            .role_of_user(user_id)
            .await
            .map_err(|e| AuthError::LookupFailed(e.to_string()))?
            .ok_or_else(|| AuthError::LookupFailed(format!("user {} not found", user_id)))?;

        let permissions = self
            .role_repo
            .permissions_of_role(role.id)
            .await
            .map_err(|e| AuthError::LookupFailed(e.to_string()))?;

        Ok((role, permissions))
    }
}

/// The admin bypass is checked before exact matching so that it holds for
/// resources that do not exist anywhere else in the data.
fn evaluate(permissions: &[Permission], resource: &str, action: &str) -> bool {
    for permission in permissions {
        if permission.is_admin_bypass() {
            return true;
        }
    }

    for permission in permissions {
        if permission.resource == resource && permission.action == action {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn perm(resource: &str, action: &str) -> Permission {
        Permission {
            id: 0,
            resource: resource.to_string(),
            action: action.to_string(),
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn exact_match_grants() {
        let perms = vec![perm("game_server", "read")];
        assert!(evaluate(&perms, "game_server", "read"));
    }

    #[test]
    fn read_does_not_imply_delete() {
        let perms = vec![perm("game_server", "read")];
        assert!(!evaluate(&perms, "game_server", "delete"));
    }

    #[test]
    fn no_prefix_or_wildcard_matching() {
        let perms = vec![perm("game_server", "read")];
        assert!(!evaluate(&perms, "game", "read"));
        assert!(!evaluate(&perms, "game_server", "*"));
        assert!(!evaluate(&perms, "*", "*"));
    }

    #[test]
    fn empty_set_denies_everything() {
        assert!(!evaluate(&[], "game_server", "read"));
    }

    proptest! {
        // The bypass row satisfies every check, including resources that
        // exist nowhere in the data.
        #[test]
        fn admin_bypass_grants_any_pair(resource in "[a-z_]{1,20}", action in "[a-z_]{1,20}") {
            let perms = vec![perm("system", "admin")];
            prop_assert!(evaluate(&perms, &resource, &action));
        }

        #[test]
        fn grants_require_exact_pairs(
            granted_res in "[a-z_]{1,12}",
            granted_act in "[a-z_]{1,12}",
            asked_res in "[a-z_]{1,12}",
            asked_act in "[a-z_]{1,12}",
        ) {
            prop_assume!(!(granted_res == "system" && granted_act == "admin"));
            let perms = vec![perm(&granted_res, &granted_act)];
            let expected = granted_res == asked_res && granted_act == asked_act;
            prop_assert_eq!(evaluate(&perms, &asked_res, &asked_act), expected);
        }
    }
}
