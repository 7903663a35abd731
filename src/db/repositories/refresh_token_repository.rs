use chrono::{DateTime, Utc};
use sqlx::PgPool;
use crate::error::AppError;
use crate::models::RefreshTokenRecord;

/// Fingerprint rows for issued refresh tokens. One row per token; rows
/// sharing a family_id descend from the same login.
pub struct RefreshTokenRepository {
    db_pool: PgPool,
}

impl RefreshTokenRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    // Record a newly issued refresh token
    pub async fn insert(
        &self,
        user_id: i64,
        token_hash: &str,
        family_id: &str,
        ip_address: &str,
        user_agent: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, family_id, ip_address, user_agent, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(family_id)
        .bind(ip_address)
        .bind(user_agent)
        .bind(expires_at)
        .execute(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to record refresh token: {}", e)))?;

        Ok(())
    }

    // Look up a refresh token row by its fingerprint
    pub async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT id, user_id, token_hash, family_id, ip_address, user_agent, expires_at, revoked_at, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch refresh token: {}", e)))?;

        Ok(record)
    }

    // Retire a single refresh token after it has been exchanged
    pub async fn revoke_by_hash(&self, token_hash: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = NOW()
            WHERE token_hash = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(token_hash)
        .execute(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to revoke refresh token: {}", e)))?;

        Ok(())
    }

    // Burn every live token descended from one login
    pub async fn revoke_family(&self, family_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = NOW()
            WHERE family_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(family_id)
        .execute(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to revoke token family: {}", e)))?;

        Ok(result.rows_affected())
    }

    // Burn every live token a user holds, across all families
    pub async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = NOW()
            WHERE user_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(user_id)
        .execute(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to revoke user refresh tokens: {}", e)))?;

        Ok(result.rows_affected())
    }
}
