use std::env;
use crate::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppSettings {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub auth: AuthConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Absent URL means the process runs without a revocation store and
    /// falls back to stateless token validation only.
    pub url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub access_expiry_minutes: i64,
    pub refresh_expiry_days: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    pub allow_registration: bool,
}

impl AppSettings {
    pub fn from_env() -> Result<Self, AppError> {
        // Database config
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Configuration("DATABASE_URL must be set".to_string()))?;

        // Redis config (optional)
        let redis_url = env::var("REDIS_URL").ok().filter(|s| !s.is_empty());

        // Server config
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| AppError::Configuration("SERVER_PORT must be a valid port number".to_string()))?;

        // CORS origins
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        // JWT config
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::Configuration("JWT_SECRET must be set".to_string()))?;

        if jwt_secret.len() < 32 {
            return Err(AppError::Configuration(
                "JWT_SECRET must be at least 32 bytes".to_string(),
            ));
        }

        let jwt_issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "gamedock".to_string());

        let access_expiry_minutes = env::var("JWT_ACCESS_EXPIRY_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse::<i64>()
            .map_err(|_| AppError::Configuration("JWT_ACCESS_EXPIRY_MINUTES must be a valid number".to_string()))?;

        let refresh_expiry_days = env::var("JWT_REFRESH_EXPIRY_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse::<i64>()
            .map_err(|_| AppError::Configuration("JWT_REFRESH_EXPIRY_DAYS must be a valid number".to_string()))?;

        // Auth config
        let allow_registration = env::var("AUTH_ALLOW_REGISTRATION")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .map_err(|_| AppError::Configuration("AUTH_ALLOW_REGISTRATION must be true or false".to_string()))?;

        Ok(Self {
            database: DatabaseConfig { url: database_url },
            redis: RedisConfig { url: redis_url },
            server: ServerConfig {
                host: server_host,
                port: server_port,
                cors_origins,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                issuer: jwt_issuer,
                access_expiry_minutes,
                refresh_expiry_days,
            },
            auth: AuthConfig { allow_registration },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn set_required_vars() {
        unsafe {
            env::set_var("DATABASE_URL", "postgres://localhost/gamedock_test");
            env::set_var(
                "JWT_SECRET",
                "0123456789abcdef0123456789abcdef-test",
            );
        }
    }

    fn clear_vars() {
        for key in [
            "DATABASE_URL",
            "REDIS_URL",
            "SERVER_HOST",
            "SERVER_PORT",
            "CORS_ORIGINS",
            "JWT_SECRET",
            "JWT_ISSUER",
            "JWT_ACCESS_EXPIRY_MINUTES",
            "JWT_REFRESH_EXPIRY_DAYS",
            "AUTH_ALLOW_REGISTRATION",
        ] {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn defaults_apply_when_only_required_vars_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_vars();
        set_required_vars();

        let settings = AppSettings::from_env().unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.jwt.issuer, "gamedock");
        assert_eq!(settings.jwt.access_expiry_minutes, 15);
        assert_eq!(settings.jwt.refresh_expiry_days, 7);
        assert!(settings.auth.allow_registration);
        assert!(settings.redis.url.is_none());

        clear_vars();
    }

    #[test]
    fn short_jwt_secret_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_vars();
        unsafe {
            env::set_var("DATABASE_URL", "postgres://localhost/gamedock_test");
            env::set_var("JWT_SECRET", "too-short");
        }

        assert!(AppSettings::from_env().is_err());

        clear_vars();
    }
}
