use sqlx::PgPool;
use crate::error::AppError;
use crate::models::GameServer;

pub struct GameServerRepository {
    db_pool: PgPool,
}

impl GameServerRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn create(
        &self,
        name: &str,
        image: &str,
        port: Option<i32>,
        owner_id: i64,
    ) -> Result<GameServer, AppError> {
        let server = sqlx::query_as::<_, GameServer>(
            r#"
            INSERT INTO game_servers (name, image, port, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, image, status, port, owner_id, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(image)
        .bind(port)
        .bind(owner_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create game server: {}", e)))?;

        Ok(server)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<GameServer>, AppError> {
        let server = sqlx::query_as::<_, GameServer>(
            r#"
            SELECT id, name, image, status, port, owner_id, created_at, updated_at
            FROM game_servers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch game server: {}", e)))?;

        Ok(server)
    }

    pub async fn list_all(&self) -> Result<Vec<GameServer>, AppError> {
        let servers = sqlx::query_as::<_, GameServer>(
            r#"
            SELECT id, name, image, status, port, owner_id, created_at, updated_at
            FROM game_servers
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list game servers: {}", e)))?;

        Ok(servers)
    }

    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<GameServer>, AppError> {
        let servers = sqlx::query_as::<_, GameServer>(
            r#"
            SELECT id, name, image, status, port, owner_id, created_at, updated_at
            FROM game_servers
            WHERE owner_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list game servers by owner: {}", e)))?;

        Ok(servers)
    }

    // Partial update; absent fields keep their current value
    pub async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        image: Option<&str>,
        port: Option<i32>,
    ) -> Result<Option<GameServer>, AppError> {
        let server = sqlx::query_as::<_, GameServer>(
            r#"
            UPDATE game_servers
            SET name = COALESCE($2, name),
                image = COALESCE($3, image),
                port = COALESCE($4, port),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, image, status, port, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(image)
        .bind(port)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update game server: {}", e)))?;

        Ok(server)
    }

    pub async fn set_status(&self, id: i64, status: &str) -> Result<Option<GameServer>, AppError> {
        let server = sqlx::query_as::<_, GameServer>(
            r#"
            UPDATE game_servers
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, image, status, port, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update game server status: {}", e)))?;

        Ok(server)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM game_servers WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete game server: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
