//! Live store adapter over the `redis` crate.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

use super::Store;
use crate::config::StoreConfig;
use crate::error::{FerryError, Result};

/// Store adapter backed by a multiplexed connection to a live server.
///
/// One connection is opened at construction and reused for the lifetime
/// of the adapter; it is released on drop.
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    /// Connect to a server using a URL in the
    /// `redis://[:password@]host[:port][/database]` convention.
    ///
    /// Authentication and database selection happen during the
    /// handshake when the URL carries them.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| FerryError::Connection(format!("failed to parse URL: {}", e)))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| FerryError::Connection(format!("failed to connect: {}", e)))?;
        Ok(Self { connection })
    }

    /// Connect using the settings from a [`StoreConfig`].
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::connect(&config.url()).await
    }
}

/// Convert a server score string to the unsigned integer encoding:
/// truncate the double toward zero, saturating at the signed 64-bit
/// range, then reinterpret the bits as unsigned.
fn score_to_u64(raw: &str) -> u64 {
    let score = raw.parse::<f64>().unwrap_or(0.0);
    (score as i64) as u64
}

/// Convert a score to its wire form: reinterpret the unsigned bits as
/// signed, the inverse of [`score_to_u64`] on the read side. Sending the
/// unsigned decimal instead would park scores above `i64::MAX` at a
/// double the readback saturates.
fn score_to_wire(score: u64) -> i64 {
    score as i64
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&mut self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.connection)
            .await?;
        Ok(value)
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async(&mut self.connection)
            .await?;
        Ok(())
    }

    async fn hset(&mut self, key: &str, field: &str, value: &str) -> Result<()> {
        let _: () = redis::cmd("HSET")
            .arg(key)
            .arg(field)
            .arg(value)
            .query_async(&mut self.connection)
            .await?;
        Ok(())
    }

    async fn hscan_all(&mut self, key: &str) -> Result<Vec<(String, String)>> {
        let mut pairs = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<(String, String)>) = redis::cmd("HSCAN")
                .arg(key)
                .arg(cursor)
                .query_async(&mut self.connection)
                .await?;
            pairs.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(pairs)
    }

    async fn hdel(&mut self, key: &str, field: &str) -> Result<()> {
        let _: () = redis::cmd("HDEL")
            .arg(key)
            .arg(field)
            .query_async(&mut self.connection)
            .await?;
        Ok(())
    }

    async fn sadd(&mut self, key: &str, member: &str) -> Result<()> {
        let _: () = redis::cmd("SADD")
            .arg(key)
            .arg(member)
            .query_async(&mut self.connection)
            .await?;
        Ok(())
    }

    async fn sscan_all(&mut self, key: &str) -> Result<Vec<String>> {
        let mut members = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SSCAN")
                .arg(key)
                .arg(cursor)
                .query_async(&mut self.connection)
                .await?;
            members.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(members)
    }

    async fn srem(&mut self, key: &str, member: &str) -> Result<()> {
        let _: () = redis::cmd("SREM")
            .arg(key)
            .arg(member)
            .query_async(&mut self.connection)
            .await?;
        Ok(())
    }

    async fn zadd(&mut self, key: &str, score: u64, member: &str) -> Result<()> {
        let _: () = redis::cmd("ZADD")
            .arg(key)
            .arg(score_to_wire(score))
            .arg(member)
            .query_async(&mut self.connection)
            .await?;
        Ok(())
    }

    async fn zscan_all(&mut self, key: &str) -> Result<Vec<(String, u64)>> {
        let mut pairs = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            // ZSCAN replies with a flat member,score,... array; scores
            // arrive as strings.
            let (next, batch): (u64, Vec<(String, String)>) = redis::cmd("ZSCAN")
                .arg(key)
                .arg(cursor)
                .query_async(&mut self.connection)
                .await?;
            for (member, score) in batch {
                pairs.push((member, score_to_u64(&score)));
            }
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(pairs)
    }

    async fn zrem(&mut self, key: &str, member: &str) -> Result<()> {
        let _: () = redis::cmd("ZREM")
            .arg(key)
            .arg(member)
            .query_async(&mut self.connection)
            .await?;
        Ok(())
    }

    async fn rpush(&mut self, key: &str, element: &str) -> Result<()> {
        let _: () = redis::cmd("RPUSH")
            .arg(key)
            .arg(element)
            .query_async(&mut self.connection)
            .await?;
        Ok(())
    }

    async fn lrange(&mut self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let elements: Vec<String> = redis::cmd("LRANGE")
            .arg(key)
            .arg(start)
            .arg(stop)
            .query_async(&mut self.connection)
            .await?;
        Ok(elements)
    }

    async fn llen(&mut self, key: &str) -> Result<i64> {
        let len: i64 = redis::cmd("LLEN")
            .arg(key)
            .query_async(&mut self.connection)
            .await?;
        Ok(len)
    }

    async fn lrem(&mut self, key: &str, count: i64, element: &str) -> Result<()> {
        let _: () = redis::cmd("LREM")
            .arg(key)
            .arg(count)
            .arg(element)
            .query_async(&mut self.connection)
            .await?;
        Ok(())
    }

    async fn del(&mut self, key: &str) -> Result<()> {
        let _: () = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut self.connection)
            .await?;
        Ok(())
    }

    async fn exists(&mut self, key: &str) -> Result<bool> {
        let present: bool = redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut self.connection)
            .await?;
        Ok(present)
    }

    async fn select(&mut self, db: u32) -> Result<()> {
        let _: () = redis::cmd("SELECT")
            .arg(db)
            .query_async(&mut self.connection)
            .await?;
        Ok(())
    }
}
