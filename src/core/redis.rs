use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{cmd, Client, RedisError};
use tokio::sync::RwLock;

const KEY_PREFIX: &str = "examhub";

/// Fixed window counter: the first hit in a window sets the expiry.
const RATE_LIMIT_SCRIPT: &str = r#"
    local current = redis.call("INCR", KEYS[1])
    if current == 1 then
        redis.call("EXPIRE", KEYS[1], ARGV[1])
    end
    return current
"#;

#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

#[derive(Debug, Clone)]
pub(crate) enum RedisHealth {
    Healthy,
    Disconnected,
    Unhealthy(String),
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let client = Client::open(self.url.clone())?;
        let manager = ConnectionManager::new(client).await?;
        let mut guard = self.manager.write().await;
        *guard = Some(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        let mut guard = self.manager.write().await;
        *guard = None;
    }

    pub(crate) async fn health(&self) -> RedisHealth {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return RedisHealth::Disconnected;
        };

        match cmd("PING").query_async::<_, String>(&mut manager).await {
            Ok(_) => RedisHealth::Healthy,
            Err(err) => RedisHealth::Unhealthy(err.to_string()),
        }
    }

    /// Returns `true` while `subject` stays within `limit` hits per window for `scope`.
    /// Without a connection every call is allowed.
    pub(crate) async fn rate_limit(
        &self,
        scope: &str,
        subject: &str,
        limit: u64,
        window_seconds: u64,
    ) -> Result<bool, RedisError> {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return Ok(true);
        };

        let current: i64 = redis::Script::new(RATE_LIMIT_SCRIPT)
            .key(rate_limit_key(scope, subject))
            .arg(window_seconds as i64)
            .invoke_async(&mut manager)
            .await?;

        Ok(current <= limit as i64)
    }
}

fn rate_limit_key(scope: &str, subject: &str) -> String {
    format!("{KEY_PREFIX}:rl:{scope}:{}", subject.trim().to_ascii_lowercase())
}
