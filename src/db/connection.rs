use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use crate::error::AppError;

/// Creates a PostgreSQL connection pool for the given URL.
///
/// This function is the central point for database connection management.
/// It configures the connection pool with appropriate timeout and connection limits.
/// If the database is not available, it will retry a few times before failing.
pub async fn create_pool(database_url: &str) -> Result<PgPool, AppError> {
    log::info!("Creating database connection pool");

    // Try to connect with retries
    let max_retries = 3;
    let mut last_error = None;

    for attempt in 1..=max_retries {
        log::info!("Database connection attempt {} of {}", attempt, max_retries);

        match PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(60))
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                log::info!("Successfully connected to database");
                return Ok(pool);
            }
            Err(e) => {
                log::warn!("Database connection attempt {} failed: {}", attempt, e);

                // Check if this is an authentication error
                if e.to_string().contains("authentication failed") {
                    log::error!("Database authentication failed. Please check your DATABASE_URL credentials.");
                    return Err(AppError::Database(e.to_string()));
                }

                if e.to_string().contains("Connection refused") {
                    log::error!("Database connection refused. Please check if the database server is running and accessible.");
                }

                last_error = Some(e);

                if attempt < max_retries {
                    // Wait before retrying
                    let delay = Duration::from_secs(2 * attempt as u64);
                    log::info!("Retrying in {} seconds...", delay.as_secs());
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    // If we get here, all retries failed
    let error = last_error.unwrap_or_else(|| {
        sqlx::Error::Configuration("Unknown database connection error".into())
    });

    log::error!("All database connection attempts failed: {}", error);

    Err(AppError::Database(error.to_string()))
}

/// Verifies the database connection by executing a simple query.
pub async fn verify_connection(pool: &PgPool) -> Result<(), AppError> {
    // Using a raw query instead of the macro to avoid compile-time database checks
    sqlx::query_as::<_, (i32,)>("SELECT 1 as result")
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Database connection verification failed: {}", e);
            AppError::Database(e.to_string())
        })?;

    log::info!("Database connection verified successfully");
    Ok(())
}

/// Applies any pending migrations from the embedded `migrations/` set.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))?;

    log::info!("Database migrations applied");
    Ok(())
}
