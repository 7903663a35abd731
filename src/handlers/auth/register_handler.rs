use actix_web::{web, HttpResponse};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use sqlx::PgPool;

use crate::config::AppSettings;
use crate::db::repositories::{RoleRepository, UserRepository};
use crate::error::AppError;
use crate::models::UserResponse;
use crate::services::auth::password;

const DEFAULT_ROLE: &str = "user";

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{3,32}$").unwrap());

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

pub async fn register(
    payload: web::Json<RegisterRequest>,
    pool: web::Data<PgPool>,
    settings: web::Data<AppSettings>,
) -> Result<HttpResponse, AppError> {
    if !settings.auth.allow_registration {
        return Err(AppError::Forbidden("Registration is disabled".to_string()));
    }

    if !USERNAME_REGEX.is_match(&payload.username) {
        return Err(AppError::Validation(
            "Username must be 3-32 characters of letters, digits, '_' or '-'".to_string(),
        ));
    }

    if payload.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let role_repo = RoleRepository::new(pool.get_ref().clone());
    let role = role_repo
        .find_by_name(DEFAULT_ROLE)
        .await?
        .ok_or_else(|| AppError::Internal("Default role is missing".to_string()))?;

    let password_hash = password::hash_password(&payload.password)?;

    let user_repo = UserRepository::new(pool.get_ref().clone());
    let user = user_repo
        .create(
            &payload.username,
            payload.email.as_deref(),
            &password_hash,
            role.id,
        )
        .await?;

    info!("Registered user {} ({})", user.username, user.id);

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}
