use sqlx::PgPool;
use crate::error::AppError;
use crate::models::{Permission, Role};

/// Lookups backing permission resolution: the role of a user and the
/// permission set of a role.
pub struct RoleRepository {
    db_pool: PgPool,
}

impl RoleRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    // Get role by name, None if absent
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, display_name, description, priority, is_system, created_at, updated_at
            FROM roles
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch role by name: {}", e)))?;

        Ok(role)
    }

    // Get the role assigned to a user, None if the user does not exist
    pub async fn role_of_user(&self, user_id: i64) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.name, r.display_name, r.description, r.priority, r.is_system, r.created_at, r.updated_at
            FROM roles r
            INNER JOIN users u ON u.role_id = r.id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch role of user: {}", e)))?;

        Ok(role)
    }

    // Get every permission granted to a role
    pub async fn permissions_of_role(&self, role_id: i64) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.resource, p.action, p.description, p.created_at
            FROM permissions p
            INNER JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.resource, p.action
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch permissions of role: {}", e)))?;

        Ok(permissions)
    }
}
