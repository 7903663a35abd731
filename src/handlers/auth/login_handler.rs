use actix_web::{web, HttpRequest, HttpResponse};
use log::{info, warn};
use serde::Deserialize;
use sqlx::PgPool;

use super::{client_info, issue_token_pair, SessionStoreData};
use crate::config::AppSettings;
use crate::db::repositories::UserRepository;
use crate::error::AppError;
use crate::services::auth::{password, tokens::TokenService};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    req: HttpRequest,
    payload: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    settings: web::Data<AppSettings>,
    tokens: web::Data<TokenService>,
    sessions: SessionStoreData,
) -> Result<HttpResponse, AppError> {
    let user_repo = UserRepository::new(pool.get_ref().clone());

    // One uniform rejection for unknown usernames and wrong passwords.
    let invalid_credentials =
        || AppError::Unauthorized("Invalid username or password".to_string());

    let user = user_repo
        .find_by_username(&payload.username)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !password::verify_password(&payload.password, &user.password_hash)? {
        warn!("Failed login attempt for user {}", user.username);
        return Err(invalid_credentials());
    }

    if !user.is_active {
        return Err(AppError::Forbidden("Account is disabled".to_string()));
    }

    let client = client_info(&req);
    let family_id = TokenService::generate_family_id();

    let response = issue_token_pair(
        &tokens,
        sessions.get_ref(),
        pool.get_ref(),
        &settings,
        user.id,
        &user.username,
        &family_id,
        &client,
    )
    .await?;

    info!(
        "User {} ({}) logged in from {}",
        user.username, user.id, client.ip_address
    );

    Ok(HttpResponse::Ok().json(response))
}
