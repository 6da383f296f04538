//! Store client adapters.
//!
//! [`Store`] is the primitive command surface the tool needs from a
//! Redis-compatible store. [`RedisStore`] drives a live server over the
//! `redis` crate; [`MemoryStore`] is an in-process implementation with
//! the same semantics, used by the test suite and for dry runs.

mod memory;
mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use async_trait::async_trait;

use crate::error::Result;

/// Primitive commands the exporter and importer are built from.
///
/// Methods take `&mut self` because every implementation is a stateful
/// connection (or an owned keyspace) driven from a single task. Sorted
/// set scores are nonnegative 64-bit integers end to end; fractional
/// scores are not supported by the interchange format.
#[async_trait]
pub trait Store: Send + Sync {
    /// GET: the string value of a key, if present.
    async fn get(&mut self, key: &str) -> Result<Option<String>>;

    /// SET: store a string value, overwriting any previous value.
    async fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// HSET: set one hash field.
    async fn hset(&mut self, key: &str, field: &str, value: &str) -> Result<()>;

    /// HSCAN to exhaustion: every field/value pair of a hash.
    async fn hscan_all(&mut self, key: &str) -> Result<Vec<(String, String)>>;

    /// HDEL: remove one hash field.
    async fn hdel(&mut self, key: &str, field: &str) -> Result<()>;

    /// SADD: add one set member.
    async fn sadd(&mut self, key: &str, member: &str) -> Result<()>;

    /// SSCAN to exhaustion: every member of a set.
    async fn sscan_all(&mut self, key: &str) -> Result<Vec<String>>;

    /// SREM: remove one set member.
    async fn srem(&mut self, key: &str, member: &str) -> Result<()>;

    /// ZADD: upsert one member with its score.
    async fn zadd(&mut self, key: &str, score: u64, member: &str) -> Result<()>;

    /// ZSCAN to exhaustion: every member/score pair of a sorted set.
    async fn zscan_all(&mut self, key: &str) -> Result<Vec<(String, u64)>>;

    /// ZREM: remove one sorted-set member.
    async fn zrem(&mut self, key: &str, member: &str) -> Result<()>;

    /// RPUSH: append one list element.
    async fn rpush(&mut self, key: &str, element: &str) -> Result<()>;

    /// LRANGE: list elements from `start` to `stop`, both inclusive;
    /// negative indexes count from the tail.
    async fn lrange(&mut self, key: &str, start: i64, stop: i64) -> Result<Vec<String>>;

    /// LLEN: list length; 0 for a missing key.
    async fn llen(&mut self, key: &str) -> Result<i64>;

    /// LREM: remove occurrences of `element`; `count` 0 removes all,
    /// positive removes from the head, negative from the tail.
    async fn lrem(&mut self, key: &str, count: i64, element: &str) -> Result<()>;

    /// DEL: remove a key of any kind.
    async fn del(&mut self, key: &str) -> Result<()>;

    /// EXISTS: whether a key is present.
    async fn exists(&mut self, key: &str) -> Result<bool>;

    /// SELECT: switch the active logical database.
    async fn select(&mut self, db: u32) -> Result<()>;
}
