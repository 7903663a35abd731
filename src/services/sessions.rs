use crate::error::AuthError;
use crate::models::SessionData;
use async_trait::async_trait;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// How long a revocation marker outlives its session. Must cover the
/// longest possible residual lifetime of any access token, so replaying
/// a blacklisted token keeps failing even after the session record has
/// expired on its own.
pub const REVOCATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Budget for a single store round trip. Exceeding it reports the store
/// as unavailable rather than failing outright.
const STORE_OP_TIMEOUT: Duration = Duration::from_secs(2);

/// Revocable session state keyed by access-token JTI.
///
/// Multi-key operations are atomic: a reader racing a revocation sees
/// the state fully before or fully after it, never in between.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Write the session record and index it under its owner, as one
    /// atomic batch.
    async fn store_session(
        &self,
        jti: &str,
        data: &SessionData,
        ttl: Duration,
    ) -> Result<(), AuthError>;

    async fn get_session(&self, jti: &str) -> Result<SessionData, AuthError>;

    /// Delete the session, set the revocation marker with its own TTL,
    /// and drop the JTI from the owner's index. Succeeds and still sets
    /// the marker when the session record is already gone; the index
    /// cleanup is skipped then because the owner is unknown.
    async fn revoke_session(&self, jti: &str, blacklist_ttl: Duration) -> Result<(), AuthError>;

    async fn is_revoked(&self, jti: &str) -> Result<bool, AuthError>;

    /// Revoke every session in the user's index and clear the index.
    /// An empty index is a no-op.
    async fn revoke_all_user_sessions(&self, user_id: i64) -> Result<(), AuthError>;
}

fn session_key(jti: &str) -> String {
    format!("session:{}", jti)
}

fn revoked_key(jti: &str) -> String {
    format!("revoked:{}", jti)
}

fn user_sessions_key(user_id: i64) -> String {
    format!("user:{}:sessions", user_id)
}

async fn with_timeout<T>(
    fut: impl std::future::Future<Output = redis::RedisResult<T>>,
) -> Result<T, AuthError> {
    match timeout(STORE_OP_TIMEOUT, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(AuthError::StoreUnavailable(
            "operation timed out".to_string(),
        )),
    }
}

/// Redis-backed session store. Multi-key writes go through MULTI/EXEC
/// pipelines.
pub struct RedisSessionStore {
    connection_manager: Arc<redis::aio::ConnectionManager>,
}

impl RedisSessionStore {
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let connection_manager = redis::aio::ConnectionManager::new(client).await?;

        info!("Redis connection established for session store");

        Ok(Self {
            connection_manager: Arc::new(connection_manager),
        })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn store_session(
        &self,
        jti: &str,
        data: &SessionData,
        ttl: Duration,
    ) -> Result<(), AuthError> {
        let payload = serde_json::to_string(data)
            .map_err(|e| AuthError::Store(format!("failed to serialize session: {}", e)))?;

        let mut conn = self.connection_manager.as_ref().clone();

        let mut pipe = redis::pipe();
        pipe.atomic()
            .set_ex(session_key(jti), payload, ttl.as_secs())
            .ignore()
            .sadd(user_sessions_key(data.user_id), jti)
            .ignore();

        let _: () = with_timeout(pipe.query_async(&mut conn)).await?;

        debug!(user_id = data.user_id, jti = jti, "Stored session");
        Ok(())
    }

    async fn get_session(&self, jti: &str) -> Result<SessionData, AuthError> {
        let mut conn = self.connection_manager.as_ref().clone();

        let payload: Option<String> = with_timeout(conn.get(session_key(jti))).await?;

        let payload = payload.ok_or(AuthError::SessionNotFound)?;
        serde_json::from_str(&payload)
            .map_err(|e| AuthError::Store(format!("corrupt session payload: {}", e)))
    }

    async fn revoke_session(&self, jti: &str, blacklist_ttl: Duration) -> Result<(), AuthError> {
        // Read the session first; only then is the owner known for the
        // index cleanup step.
        let data = match self.get_session(jti).await {
            Ok(data) => Some(data),
            Err(AuthError::SessionNotFound) => None,
            Err(e) => return Err(e),
        };

        let mut conn = self.connection_manager.as_ref().clone();

        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(session_key(jti))
            .ignore()
            .set_ex(revoked_key(jti), "1", blacklist_ttl.as_secs())
            .ignore();

        if let Some(data) = &data {
            pipe.srem(user_sessions_key(data.user_id), jti).ignore();
        }

        let _: () = with_timeout(pipe.query_async(&mut conn)).await?;

        debug!(jti = jti, "Revoked session");
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, AuthError> {
        let mut conn = self.connection_manager.as_ref().clone();

        let exists: bool = with_timeout(conn.exists(revoked_key(jti))).await?;
        Ok(exists)
    }

    async fn revoke_all_user_sessions(&self, user_id: i64) -> Result<(), AuthError> {
        let mut conn = self.connection_manager.as_ref().clone();

        let jtis: Vec<String> = with_timeout(conn.smembers(user_sessions_key(user_id))).await?;

        if jtis.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();

        for jti in &jtis {
            pipe.del(session_key(jti)).ignore();
            pipe.set_ex(revoked_key(jti), "1", REVOCATION_TTL.as_secs())
                .ignore();
        }
        pipe.del(user_sessions_key(user_id)).ignore();

        let _: () = with_timeout(pipe.query_async(&mut conn)).await?;

        debug!(
            user_id = user_id,
            count = jtis.len(),
            "Revoked all sessions for user"
        );
        Ok(())
    }
}

/// Stands in when no session store is configured. Every operation
/// succeeds and nothing is ever revoked, so authentication falls back to
/// stateless token validation alone.
pub struct NoopSessionStore;

#[async_trait]
impl SessionStore for NoopSessionStore {
    async fn store_session(
        &self,
        _jti: &str,
        _data: &SessionData,
        _ttl: Duration,
    ) -> Result<(), AuthError> {
        Ok(())
    }

    async fn get_session(&self, _jti: &str) -> Result<SessionData, AuthError> {
        Err(AuthError::SessionNotFound)
    }

    async fn revoke_session(&self, _jti: &str, _blacklist_ttl: Duration) -> Result<(), AuthError> {
        Ok(())
    }

    async fn is_revoked(&self, _jti: &str) -> Result<bool, AuthError> {
        Ok(false)
    }

    async fn revoke_all_user_sessions(&self, _user_id: i64) -> Result<(), AuthError> {
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::InMemorySessionStore;
    use super::*;

    fn sample(user_id: i64) -> SessionData {
        SessionData::new(user_id, "192.0.2.10".to_string(), "curl/8.0".to_string())
    }

    #[tokio::test]
    async fn store_then_get_returns_what_was_stored() {
        let store = InMemorySessionStore::new();
        let data = sample(1);

        store
            .store_session("jti-1", &data, Duration::from_secs(900))
            .await
            .unwrap();

        let loaded = store.get_session("jti-1").await.unwrap();
        assert_eq!(loaded, data);
    }

    #[tokio::test]
    async fn revoke_deletes_session_and_sets_marker() {
        let store = InMemorySessionStore::new();
        store
            .store_session("jti-1", &sample(1), Duration::from_secs(900))
            .await
            .unwrap();

        assert!(!store.is_revoked("jti-1").await.unwrap());

        store
            .revoke_session("jti-1", REVOCATION_TTL)
            .await
            .unwrap();

        assert!(matches!(
            store.get_session("jti-1").await.unwrap_err(),
            AuthError::SessionNotFound
        ));
        assert!(store.is_revoked("jti-1").await.unwrap());
        assert_eq!(store.user_index_len(1), 0);
    }

    #[tokio::test]
    async fn revoking_an_absent_session_still_blacklists_it() {
        let store = InMemorySessionStore::new();

        store
            .revoke_session("never-stored", REVOCATION_TTL)
            .await
            .unwrap();

        assert!(store.is_revoked("never-stored").await.unwrap());
    }

    #[tokio::test]
    async fn revoke_all_clears_index_and_blacklists_every_session() {
        let store = InMemorySessionStore::new();
        for i in 0..3 {
            let jti = format!("jti-{}", i);
            store
                .store_session(&jti, &sample(7), Duration::from_secs(900))
                .await
                .unwrap();
        }

        store.revoke_all_user_sessions(7).await.unwrap();

        for i in 0..3 {
            let jti = format!("jti-{}", i);
            assert!(store.is_revoked(&jti).await.unwrap());
            assert!(matches!(
                store.get_session(&jti).await.unwrap_err(),
                AuthError::SessionNotFound
            ));
        }
        assert_eq!(store.user_index_len(7), 0);
    }

    #[tokio::test]
    async fn revoke_all_with_empty_index_is_a_no_op() {
        let store = InMemorySessionStore::new();
        store.revoke_all_user_sessions(42).await.unwrap();
    }

    #[tokio::test]
    async fn revoking_one_session_leaves_the_others() {
        let store = InMemorySessionStore::new();
        store
            .store_session("keep", &sample(9), Duration::from_secs(900))
            .await
            .unwrap();
        store
            .store_session("drop", &sample(9), Duration::from_secs(900))
            .await
            .unwrap();

        store.revoke_session("drop", REVOCATION_TTL).await.unwrap();

        assert!(store.get_session("keep").await.is_ok());
        assert!(!store.is_revoked("keep").await.unwrap());
        assert_eq!(store.user_index_len(9), 1);
    }

    #[tokio::test]
    async fn noop_store_never_revokes() {
        let store = NoopSessionStore;
        let data = sample(3);

        store
            .store_session("jti-x", &data, Duration::from_secs(900))
            .await
            .unwrap();
        store.revoke_session("jti-x", REVOCATION_TTL).await.unwrap();

        assert!(!store.is_revoked("jti-x").await.unwrap());
        assert!(matches!(
            store.get_session("jti-x").await.unwrap_err(),
            AuthError::SessionNotFound
        ));
        store.revoke_all_user_sessions(3).await.unwrap();
    }
}
