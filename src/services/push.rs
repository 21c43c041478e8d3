use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use thiserror::Error;

/// Errors that can occur on the real-time push channel
#[derive(Debug, Error)]
pub enum PushError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Best-effort delivery to a user's currently connected sessions
///
/// No delivery acknowledgement is assumed; a user with no live session
/// simply receives nothing.
#[async_trait]
pub trait PushChannel: Send + Sync {
    async fn publish_to_user(
        &self,
        user_id: &str,
        event: &str,
        payload: &serde_json::Value,
    ) -> Result<(), PushError>;
}

/// Redis pub/sub push channel
///
/// Sessions subscribe to their user's channel; one PUBLISH reaches every
/// connected session for that identity.
pub struct RedisPush {
    conn: Arc<tokio::sync::Mutex<ConnectionManager>>,
}

impl RedisPush {
    pub async fn connect(redis_url: &str) -> Result<Self, PushError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self {
            conn: Arc::new(tokio::sync::Mutex::new(conn)),
        })
    }

    fn channel(user_id: &str) -> String {
        format!("user:{}", user_id)
    }
}

#[async_trait]
impl PushChannel for RedisPush {
    async fn publish_to_user(
        &self,
        user_id: &str,
        event: &str,
        payload: &serde_json::Value,
    ) -> Result<(), PushError> {
        let message = serde_json::to_string(&serde_json::json!({
            "event": event,
            "payload": payload,
        }))?;

        let mut conn = self.conn.lock().await;
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(Self::channel(user_id))
            .arg(message)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        tracing::trace!(user_id, event, receivers, "Push published");

        Ok(())
    }
}
