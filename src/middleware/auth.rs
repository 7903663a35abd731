use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures_util::future::{ok, ready, Ready};
use log::{debug, warn};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::error::{AppError, AuthError};
use crate::models::AuthenticatedUser;
use crate::services::auth::tokens::TokenService;
use crate::services::sessions::SessionStore;

/// Extract the Bearer token from the Authorization header, if any.
pub fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    let auth_str = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Authentication middleware: validates the Bearer access token, checks
/// it against the revocation list, and inserts [`AuthenticatedUser`] into
/// request extensions for handlers downstream.
///
/// Rejections: missing credential, invalid/expired token, and revoked
/// token are all 401; a session store that answers with a hard error is
/// a 500. A store that cannot be reached at all (timeout, connection
/// refused) is NOT a rejection: the check degrades to "assume not
/// revoked" so that authentication keeps working on stateless token
/// validation alone. That trades strict revocation for availability,
/// deliberately.
#[derive(Clone)]
pub struct AuthenticationGate {
    token_service: Arc<TokenService>,
    session_store: Arc<dyn SessionStore>,
}

impl AuthenticationGate {
    pub fn new(token_service: Arc<TokenService>, session_store: Arc<dyn SessionStore>) -> Self {
        Self {
            token_service,
            session_store,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthenticationGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthenticationGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthenticationGateMiddleware {
            service: Arc::new(service),
            token_service: self.token_service.clone(),
            session_store: self.session_store.clone(),
        })
    }
}

pub struct AuthenticationGateMiddleware<S> {
    service: Arc<S>,
    token_service: Arc<TokenService>,
    session_store: Arc<dyn SessionStore>,
}

impl<S, B> Service<ServiceRequest> for AuthenticationGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        // CORS pre-flight carries no credentials
        if req.method() == actix_web::http::Method::OPTIONS {
            return Box::pin(service.call(req));
        }

        let token = match extract_bearer_token(&req) {
            Some(token) => token,
            None => {
                warn!("Missing bearer token for path: {}", req.path());
                return Box::pin(ready(Err(
                    AppError::Unauthorized("Missing bearer token".to_string()).into(),
                )));
            }
        };

        let claims = match self.token_service.validate_access_token(&token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Token validation failed for path {}: {}", req.path(), e);
                return Box::pin(ready(Err(AppError::from(e).into())));
            }
        };

        let session_store = self.session_store.clone();

        Box::pin(async move {
            match session_store.is_revoked(&claims.jti).await {
                Ok(false) => {}
                Ok(true) => {
                    warn!(
                        "Rejected revoked token for user {} (jti {})",
                        claims.user_id, claims.jti
                    );
                    return Err(AppError::from(AuthError::Revoked).into());
                }
                // Unreachable store: accept the token on its signature and
                // expiry alone. Revocation is best-effort by design; an
                // outage here must not take authentication down with it.
                Err(e) if e.is_store_unavailable() => {
                    warn!(
                        "Session store unreachable, skipping revocation check for jti {}: {}",
                        claims.jti, e
                    );
                }
                Err(e) => {
                    return Err(AppError::from(e).into());
                }
            }

            debug!(
                "Authenticated user {} ({}) for path {}",
                claims.user_id,
                claims.username,
                req.path()
            );

            req.extensions_mut().insert(AuthenticatedUser {
                user_id: claims.user_id,
                username: claims.username.clone(),
                jti: claims.jti.clone(),
            });

            service.call(req).await
        })
    }
}
