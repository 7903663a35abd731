use sqlx::PgPool;
use crate::error::AppError;
use crate::models::User;

pub struct UserRepository {
    db_pool: PgPool,
}

impl UserRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    // Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<User, AppError> {
        // Raw queries throughout; the macro forms need a live database at
        // compile time.
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role_id, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("User not found: {}", id)),
            _ => AppError::Database(format!("Failed to fetch user: {}", e)),
        })?;

        Ok(user)
    }

    // Get user by username, None if absent
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role_id, is_active, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch user by username: {}", e)))?;

        Ok(user)
    }

    // Create a new user
    pub async fn create(
        &self,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
        role_id: i64,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, role_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, role_id, is_active, created_at, updated_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Username already taken: {}", username))
            }
            _ => AppError::Database(format!("Failed to create user: {}", e)),
        })?;

        Ok(user)
    }

    // List all users, newest last
    pub async fn list_all(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role_id, is_active, created_at, updated_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list users: {}", e)))?;

        Ok(users)
    }
}
