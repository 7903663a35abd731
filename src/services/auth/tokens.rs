use crate::config::settings::JwtConfig;
use crate::error::{AppError, AuthError};
use crate::models::{AccessTokenClaims, RefreshTokenClaims};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error};
use uuid::Uuid;

// Fallback expiries when the configured values overflow
const DEFAULT_ACCESS_EXPIRY_MINUTES: i64 = 15;
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;

/// Mints and validates the two token kinds with one symmetric secret.
///
/// Stateless apart from the keys; a single instance is shared across
/// request tasks without synchronization.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_expiry: Duration,
    refresh_expiry: Duration,
}

impl TokenService {
    pub fn new(
        secret: &str,
        issuer: &str,
        access_expiry_minutes: i64,
        refresh_expiry_days: i64,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            access_expiry: Duration::try_minutes(access_expiry_minutes)
                .unwrap_or_else(|| Duration::minutes(DEFAULT_ACCESS_EXPIRY_MINUTES)),
            refresh_expiry: Duration::try_days(refresh_expiry_days)
                .unwrap_or_else(|| Duration::days(DEFAULT_REFRESH_EXPIRY_DAYS)),
        }
    }

    pub fn from_config(jwt: &JwtConfig) -> Self {
        Self::new(
            &jwt.secret,
            &jwt.issuer,
            jwt.access_expiry_minutes,
            jwt.refresh_expiry_days,
        )
    }

    /// How long a freshly minted access token lives. Session records use
    /// the same TTL.
    pub fn access_expiry(&self) -> Duration {
        self.access_expiry
    }

    pub fn refresh_expiry(&self) -> Duration {
        self.refresh_expiry
    }

    /// A fresh identifier grouping the refresh tokens of one login.
    pub fn generate_family_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Mint an access token. Returns the signed token together with its
    /// JTI so callers can register or revoke the session without parsing
    /// the token back.
    pub fn issue_access_token(
        &self,
        user_id: i64,
        username: &str,
    ) -> Result<(String, String), AppError> {
        let jti = Uuid::new_v4().to_string();
        let now = Utc::now();
        let exp = now + self.access_expiry;

        let claims = AccessTokenClaims {
            user_id,
            username: username.to_string(),
            jti: jti.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.issuer.clone(),
        };

        let header = Header::new(Algorithm::HS256);

        debug!("Issuing access token for user {} (exp: {})", user_id, exp);
        let token = encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!("Failed to issue access token: {}", e);
            AppError::Internal(format!("Token generation failed: {}", e))
        })?;

        Ok((token, jti))
    }

    /// Mint a refresh token within the given family.
    pub fn issue_refresh_token(&self, user_id: i64, family_id: &str) -> Result<String, AppError> {
        let jti = Uuid::new_v4().to_string();
        let now = Utc::now();
        let exp = now + self.refresh_expiry;

        let claims = RefreshTokenClaims {
            user_id,
            family_id: family_id.to_string(),
            jti,
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.issuer.clone(),
        };

        let header = Header::new(Algorithm::HS256);

        encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!("Failed to issue refresh token: {}", e);
            AppError::Internal(format!("Token generation failed: {}", e))
        })
    }

    /// Validate an access token. `ExpiredToken` is reported only when
    /// expiry is the sole defect; every other failure is `InvalidToken`.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation())
            .map_err(map_validation_error)?;

        Ok(token_data.claims)
    }

    /// Validate a refresh token with the same error taxonomy.
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshTokenClaims, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let token_data =
            decode::<RefreshTokenClaims>(token, &self.decoding_key, &self.validation())
                .map_err(map_validation_error)?;

        Ok(token_data.claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_nbf = true;
        validation
    }
}

fn map_validation_error(err: jsonwebtoken::errors::Error) -> AuthError {
    debug!("Token validation failed: {:?}", err.kind());
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TEST_SECRET: &str = "a-test-secret-of-at-least-32-bytes!";
    const TEST_ISSUER: &str = "gamedock";

    fn service() -> TokenService {
        TokenService::new(TEST_SECRET, TEST_ISSUER, 15, 7)
    }

    #[test]
    fn access_token_round_trip_preserves_claims() {
        let svc = service();
        let (token, jti) = svc.issue_access_token(42, "steve").unwrap();

        let claims = svc.validate_access_token(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.username, "steve");
        assert_eq!(claims.iss, TEST_ISSUER);
        assert!(!claims.jti.is_empty());
        assert_eq!(claims.jti, jti);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn repeated_issuance_is_fresh() {
        let svc = service();
        let (t1, j1) = svc.issue_access_token(1, "alex").unwrap();
        let (t2, j2) = svc.issue_access_token(1, "alex").unwrap();

        assert_ne!(t1, t2);
        assert_ne!(j1, j2);
    }

    #[test]
    fn jti_is_url_safe() {
        let svc = service();
        let (_, jti) = svc.issue_access_token(7, "kai").unwrap();
        assert!(jti
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }

    #[test]
    fn wrong_secret_is_invalid_token() {
        let svc_a = service();
        let svc_b = TokenService::new(
            "another-secret-that-is-32-bytes-long!",
            TEST_ISSUER,
            15,
            7,
        );

        let (token, _) = svc_a.issue_access_token(1, "alex").unwrap();
        let err = svc_b.validate_access_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn wrong_issuer_is_invalid_token() {
        let minting = TokenService::new(TEST_SECRET, "someone-else", 15, 7);
        let validating = service();

        let (token, _) = minting.issue_access_token(1, "alex").unwrap();
        let err = validating.validate_access_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn expired_token_is_exactly_expired_token() {
        // Minted two minutes in the past, past the default leeway
        let svc = TokenService::new(TEST_SECRET, TEST_ISSUER, -2, 7);
        let (token, _) = svc.issue_access_token(1, "alex").unwrap();

        let validating = service();
        let err = validating.validate_access_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::ExpiredToken));
    }

    #[test]
    fn not_yet_valid_token_is_invalid_token() {
        let now = Utc::now().timestamp();
        let claims = AccessTokenClaims {
            user_id: 1,
            username: "alex".to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            nbf: now + 300,
            exp: now + 600,
            iss: TEST_ISSUER.to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        let err = service().validate_access_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn empty_and_malformed_tokens_are_invalid() {
        let svc = service();
        assert!(matches!(
            svc.validate_access_token("").unwrap_err(),
            AuthError::InvalidToken
        ));
        assert!(matches!(
            svc.validate_access_token("not.a.jwt").unwrap_err(),
            AuthError::InvalidToken
        ));
        assert!(matches!(
            svc.validate_refresh_token("").unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[test]
    fn refresh_token_round_trip_preserves_family() {
        let svc = service();
        let family = TokenService::generate_family_id();
        let token = svc.issue_refresh_token(9, &family).unwrap();

        let claims = svc.validate_refresh_token(&token).unwrap();
        assert_eq!(claims.user_id, 9);
        assert_eq!(claims.family_id, family);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn token_kinds_do_not_cross_validate() {
        let svc = service();
        let family = TokenService::generate_family_id();

        let refresh = svc.issue_refresh_token(3, &family).unwrap();
        assert!(matches!(
            svc.validate_access_token(&refresh).unwrap_err(),
            AuthError::InvalidToken
        ));

        let (access, _) = svc.issue_access_token(3, "sam").unwrap();
        assert!(matches!(
            svc.validate_refresh_token(&access).unwrap_err(),
            AuthError::InvalidToken
        ));
    }
}
