use super::transport::{NodeConnector, NodeTransport, TransportResult};
use super::types::NodeAddr;
use crate::config::ClusterConfig;
use crate::error::TransportError;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Timeouts and retry budget shared by every Redis node handle.
#[derive(Debug, Clone)]
pub struct RedisOptions {
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    pub connect_attempts: usize,
}

impl From<&ClusterConfig> for RedisOptions {
    fn from(config: &ClusterConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            response_timeout: config.response_timeout(),
            connect_attempts: config.connect_attempts.max(1),
        }
    }
}

impl Default for RedisOptions {
    fn default() -> Self {
        Self::from(&ClusterConfig::default())
    }
}

/// Node handle speaking the Redis protocol.
///
/// The connection is opened lazily on first use and then shared: a
/// `MultiplexedConnection` pipelines concurrent requests over one socket, so
/// a single handle serves any number of tasks. A multiplexed connection does
/// not heal itself, so a command failing with an I/O error discards it and
/// the next call dials again through the retry loop.
pub struct RedisNode {
    addr: NodeAddr,
    client: redis::Client,
    connection: Mutex<ConnectionSlot>,
    options: RedisOptions,
}

/// Current connection plus a counter bumped on every dial, so a stale
/// failure cannot discard a connection opened after it.
#[derive(Default)]
struct ConnectionSlot {
    generation: u64,
    current: Option<MultiplexedConnection>,
}

impl RedisNode {
    /// Validates the address; no network I/O happens here.
    pub fn new(addr: NodeAddr, options: RedisOptions) -> TransportResult<Self> {
        let client = redis::Client::open(addr.redis_url())?;
        Ok(Self {
            addr,
            client,
            connection: Mutex::new(ConnectionSlot::default()),
            options,
        })
    }

    async fn connection(&self) -> TransportResult<(u64, MultiplexedConnection)> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = &slot.current {
            return Ok((slot.generation, conn.clone()));
        }
        let conn = self.connect_with_retry().await?;
        slot.generation += 1;
        slot.current = Some(conn.clone());
        Ok((slot.generation, conn))
    }

    async fn discard_if_broken(&self, generation: u64, err: &TransportError) {
        let TransportError::Redis(e) = err else {
            return;
        };
        if !(e.is_io_error() || e.is_connection_dropped()) {
            return;
        }
        let mut slot = self.connection.lock().await;
        if slot.generation == generation && slot.current.take().is_some() {
            tracing::warn!("Connection to {} lost ({}), will reconnect", self.addr, e);
        }
    }

    async fn connect_with_retry(&self) -> TransportResult<MultiplexedConnection> {
        let mut delay_ms = 150u64;
        let attempts = self.options.connect_attempts;

        for attempt in 0..attempts {
            let result = tokio::time::timeout(
                self.options.connect_timeout,
                self.client.get_multiplexed_async_connection(),
            )
            .await;

            let err = match result {
                Ok(Ok(conn)) => {
                    tracing::debug!("Connected to {}", self.addr);
                    return Ok(conn);
                }
                Ok(Err(e)) => TransportError::Redis(e),
                Err(_) => TransportError::Timeout {
                    addr: self.addr.clone(),
                    after: self.options.connect_timeout,
                },
            };

            if attempt + 1 == attempts {
                return Err(err);
            }
            tracing::warn!(
                "Connect to {} failed (attempt {}/{}): {}",
                self.addr,
                attempt + 1,
                attempts,
                err
            );
            let jitter = rand::random::<u64>() % 50;
            tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
            delay_ms = (delay_ms * 2).min(1200);
        }

        Err(TransportError::Unavailable {
            addr: self.addr.clone(),
        })
    }

    /// Runs one command under the response deadline.
    async fn deadline<T, F>(&self, fut: F) -> TransportResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.options.response_timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(TransportError::Timeout {
                addr: self.addr.clone(),
                after: self.options.response_timeout,
            }),
        }
    }

    async fn run<T, F, Fut>(&self, command: F) -> TransportResult<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let (generation, conn) = self.connection().await?;
        let result = self.deadline(command(conn)).await;
        if let Err(e) = &result {
            self.discard_if_broken(generation, e).await;
        }
        result
    }
}

#[async_trait]
impl NodeTransport for RedisNode {
    fn addr(&self) -> &NodeAddr {
        &self.addr
    }

    async fn hash_field_count(&self, space: &str) -> TransportResult<u64> {
        self.run(|mut conn| async move { conn.hlen(space).await }).await
    }

    async fn field_exists(&self, space: &str, field: &str) -> TransportResult<bool> {
        self.run(|mut conn| async move { conn.hexists(space, field).await }).await
    }

    async fn get_field(&self, space: &str, field: &str) -> TransportResult<Option<String>> {
        self.run(|mut conn| async move { conn.hget(space, field).await }).await
    }

    async fn get_all_values(&self, space: &str) -> TransportResult<Vec<String>> {
        self.run(|mut conn| async move { conn.hvals(space).await }).await
    }

    async fn get_all_fields(&self, space: &str) -> TransportResult<Vec<String>> {
        self.run(|mut conn| async move { conn.hkeys(space).await }).await
    }

    async fn get_all_entries(&self, space: &str) -> TransportResult<Vec<(String, String)>> {
        let all: HashMap<String, String> = self
            .run(|mut conn| async move { conn.hgetall(space).await })
            .await?;
        Ok(all.into_iter().collect())
    }

    async fn delete_space(&self, space: &str) -> TransportResult<()> {
        let _removed: i64 = self
            .run(|mut conn| async move { conn.del(space).await })
            .await?;
        Ok(())
    }

    async fn atomic_read_then_set(
        &self,
        space: &str,
        field: &str,
        value: &str,
    ) -> TransportResult<Option<String>> {
        let mut pipe = redis::pipe();
        pipe.atomic()
            .hget(space, field)
            .hset(space, field, value)
            .ignore();

        let (prev,): (Option<String>,) = self
            .run(|mut conn| async move { pipe.query_async(&mut conn).await })
            .await?;
        Ok(prev)
    }

    async fn atomic_read_then_delete(
        &self,
        space: &str,
        field: &str,
    ) -> TransportResult<Option<String>> {
        let mut pipe = redis::pipe();
        pipe.atomic().hget(space, field).hdel(space, field).ignore();

        let (prev,): (Option<String>,) = self
            .run(|mut conn| async move { pipe.query_async(&mut conn).await })
            .await?;
        Ok(prev)
    }

    async fn batch_set(&self, space: &str, entries: Vec<(String, String)>) -> TransportResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (field, value) in &entries {
            pipe.hset(space, field, value).ignore();
        }

        let () = self
            .run(|mut conn| async move { pipe.query_async(&mut conn).await })
            .await?;
        Ok(())
    }
}

/// Connector creating one `RedisNode` per registered address.
#[derive(Debug, Clone, Default)]
pub struct RedisConnector {
    options: RedisOptions,
}

impl RedisConnector {
    pub fn new(options: RedisOptions) -> Self {
        Self { options }
    }
}

impl NodeConnector for RedisConnector {
    fn connect(&self, addr: &NodeAddr) -> TransportResult<Arc<dyn NodeTransport>> {
        let node = RedisNode::new(addr.clone(), self.options.clone())?;
        Ok(Arc::new(node))
    }
}
