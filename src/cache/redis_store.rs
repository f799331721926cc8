//! Redis cache backend.

use std::fmt;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::OnceCell;
use tracing::info;

use super::backend::CacheBackend;
use super::error::CacheResult;

/// Redis-backed store using `GET` / `SET EX`.
///
/// The connection manager is created on first use and reconnects on its own
/// afterwards. If the first connection attempt fails, the next call retries.
#[derive(Clone)]
pub struct RedisBackend {
    client: Client,
    connection: std::sync::Arc<OnceCell<ConnectionManager>>,
}

impl fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBackend")
            .field("connected", &self.connection.initialized())
            .finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Parses the URL; does not connect.
    pub fn new(url: &str) -> CacheResult<Self> {
        let client = Client::open(url)?;
        Ok(Self {
            client,
            connection: std::sync::Arc::new(OnceCell::new()),
        })
    }

    async fn connection(&self) -> CacheResult<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new(self.client.clone()).await?;
                info!("Connected to Redis");
                Ok::<_, redis::RedisError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }
}

impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let ttl_secs = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
