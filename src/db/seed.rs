use sqlx::PgPool;
use crate::error::AppError;
use crate::services::auth::password;

const DEFAULT_PERMISSIONS: &[(&str, &str, &str)] = &[
    ("system", "admin", "Full system access"),
    ("game_server", "create", "Create servers"),
    ("game_server", "read", "View servers"),
    ("game_server", "update", "Edit servers"),
    ("game_server", "delete", "Delete servers"),
    ("game_server", "start", "Start servers"),
    ("game_server", "stop", "Stop servers"),
    ("mod", "create", "Add mods"),
    ("mod", "read", "View mods"),
    ("mod", "update", "Edit mods"),
    ("mod", "delete", "Delete mods"),
    ("user", "create", "Create users"),
    ("user", "read", "View users"),
    ("user", "update", "Edit users"),
    ("user", "delete", "Delete users"),
    ("role", "manage", "Manage roles"),
    ("audit_log", "read", "View audit logs"),
];

const DEFAULT_ROLES: &[(&str, &str, i32)] = &[
    ("admin", "Administrator", 100),
    ("moderator", "Moderator", 50),
    ("user", "User", 10),
    ("guest", "Guest", 0),
];

/// Populates the database with default roles, permissions, and the
/// initial admin account. Safe to run on every startup.
pub async fn seed(pool: &PgPool) -> Result<(), AppError> {
    seed_permissions(pool).await?;
    seed_roles(pool).await?;
    assign_role_permissions(pool).await?;
    seed_default_admin(pool).await?;
    Ok(())
}

async fn seed_permissions(pool: &PgPool) -> Result<(), AppError> {
    for (resource, action, description) in DEFAULT_PERMISSIONS {
        sqlx::query(
            r#"
            INSERT INTO permissions (resource, action, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (resource, action) DO NOTHING
            "#,
        )
        .bind(resource)
        .bind(action)
        .bind(description)
        .execute(pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to seed permission {}:{}: {}", resource, action, e)))?;
    }
    Ok(())
}

async fn seed_roles(pool: &PgPool) -> Result<(), AppError> {
    for (name, display_name, priority) in DEFAULT_ROLES {
        sqlx::query(
            r#"
            INSERT INTO roles (name, display_name, priority, is_system)
            VALUES ($1, $2, $3, TRUE)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(display_name)
        .bind(priority)
        .execute(pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to seed role {}: {}", name, e)))?;
    }
    Ok(())
}

async fn grant(pool: &PgPool, role: &str, resource: &str, action: &str) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission_id)
        SELECT r.id, p.id
        FROM roles r, permissions p
        WHERE r.name = $1 AND p.resource = $2 AND p.action = $3
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(role)
    .bind(resource)
    .bind(action)
    .execute(pool)
    .await
    .map_err(|e| AppError::Database(format!("Failed to grant {}:{} to {}: {}", resource, action, role, e)))?;

    Ok(())
}

async fn assign_role_permissions(pool: &PgPool) -> Result<(), AppError> {
    // Admin holds only the bypass permission; everything else follows
    // from it at evaluation time.
    grant(pool, "admin", "system", "admin").await?;

    for action in ["create", "read", "update", "delete", "start", "stop"] {
        grant(pool, "moderator", "game_server", action).await?;
    }
    for action in ["create", "read", "update", "delete"] {
        grant(pool, "moderator", "mod", action).await?;
    }
    grant(pool, "moderator", "user", "read").await?;

    grant(pool, "user", "game_server", "read").await?;
    grant(pool, "user", "mod", "read").await?;

    // Guest role has no permissions by default

    Ok(())
}

async fn seed_default_admin(pool: &PgPool) -> Result<(), AppError> {
    let existing = sqlx::query_as::<_, (i64,)>("SELECT id FROM users WHERE username = 'admin'")
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to check for admin user: {}", e)))?;

    if existing.is_some() {
        return Ok(());
    }

    let role = sqlx::query_as::<_, (i64,)>("SELECT id FROM roles WHERE name = 'admin'")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch admin role: {}", e)))?;

    let password_hash = password::hash_password("admin")?;

    sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, role_id)
        VALUES ('admin', $1, $2)
        "#,
    )
    .bind(&password_hash)
    .bind(role.0)
    .execute(pool)
    .await
    .map_err(|e| AppError::Database(format!("Failed to create admin user: {}", e)))?;

    log::warn!("Created default admin user with default password; change it immediately");

    Ok(())
}
