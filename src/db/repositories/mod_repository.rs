use sqlx::PgPool;
use crate::error::AppError;
use crate::models::GameMod;

pub struct ModRepository {
    db_pool: PgPool,
}

impl ModRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn create(
        &self,
        name: &str,
        slug: &str,
        description: &str,
        source_url: &str,
        version: &str,
    ) -> Result<GameMod, AppError> {
        let game_mod = sqlx::query_as::<_, GameMod>(
            r#"
            INSERT INTO mods (name, slug, description, source_url, version)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, slug, description, source_url, version, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(source_url)
        .bind(version)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Mod name or slug already taken: {}", slug))
            }
            _ => AppError::Database(format!("Failed to create mod: {}", e)),
        })?;

        Ok(game_mod)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<GameMod>, AppError> {
        let game_mod = sqlx::query_as::<_, GameMod>(
            r#"
            SELECT id, name, slug, description, source_url, version, created_at, updated_at
            FROM mods
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch mod: {}", e)))?;

        Ok(game_mod)
    }

    pub async fn list_all(&self) -> Result<Vec<GameMod>, AppError> {
        let mods = sqlx::query_as::<_, GameMod>(
            r#"
            SELECT id, name, slug, description, source_url, version, created_at, updated_at
            FROM mods
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list mods: {}", e)))?;

        Ok(mods)
    }

    // Partial update; absent fields keep their current value
    pub async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        description: Option<&str>,
        source_url: Option<&str>,
        version: Option<&str>,
    ) -> Result<Option<GameMod>, AppError> {
        let game_mod = sqlx::query_as::<_, GameMod>(
            r#"
            UPDATE mods
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                source_url = COALESCE($4, source_url),
                version = COALESCE($5, version),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, slug, description, source_url, version, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(source_url)
        .bind(version)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Mod name already taken: {}", id))
            }
            _ => AppError::Database(format!("Failed to update mod: {}", e)),
        })?;

        Ok(game_mod)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM mods WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete mod: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
