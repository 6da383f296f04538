//! In-memory store used by the test suites.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;

use super::Store;
use crate::error::{FerryError, Result};

enum Value {
    String(String),
    Hash(BTreeMap<String, String>),
    List(Vec<String>),
    Set(BTreeSet<String>),
    ZSet(BTreeMap<String, u64>),
}

/// Store adapter holding everything in process memory.
///
/// Keeps the live adapter's observable behavior where the migration
/// paths depend on it: type mismatches error, reads of absent keys
/// come back empty, and collections vanish once their last element is
/// removed.
#[derive(Default)]
pub struct MemoryStore {
    databases: HashMap<u32, HashMap<String, Value>>,
    current: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn db(&mut self) -> &mut HashMap<String, Value> {
        self.databases.entry(self.current).or_default()
    }

    /// Keys in the current database, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .databases
            .get(&self.current)
            .map(|db| db.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

fn wrong_kind(key: &str, expected: &'static str) -> FerryError {
    FerryError::WrongKind {
        key: key.to_string(),
        expected,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&mut self, key: &str) -> Result<Option<String>> {
        match self.db().get(key) {
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(wrong_kind(key, "string")),
            None => Ok(None),
        }
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.db()
            .insert(key.to_string(), Value::String(value.to_string()));
        Ok(())
    }

    async fn hset(&mut self, key: &str, field: &str, value: &str) -> Result<()> {
        let entry = self
            .db()
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(BTreeMap::new()));
        match entry {
            Value::Hash(map) => {
                map.insert(field.to_string(), value.to_string());
                Ok(())
            }
            _ => Err(wrong_kind(key, "hash")),
        }
    }

    async fn hscan_all(&mut self, key: &str) -> Result<Vec<(String, String)>> {
        match self.db().get(key) {
            Some(Value::Hash(map)) => Ok(map
                .iter()
                .map(|(f, v)| (f.clone(), v.clone()))
                .collect()),
            Some(_) => Err(wrong_kind(key, "hash")),
            None => Ok(Vec::new()),
        }
    }

    async fn hdel(&mut self, key: &str, field: &str) -> Result<()> {
        let emptied = match self.db().get_mut(key) {
            Some(Value::Hash(map)) => {
                map.remove(field);
                map.is_empty()
            }
            Some(_) => return Err(wrong_kind(key, "hash")),
            None => false,
        };
        if emptied {
            self.db().remove(key);
        }
        Ok(())
    }

    async fn sadd(&mut self, key: &str, member: &str) -> Result<()> {
        let entry = self
            .db()
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(BTreeSet::new()));
        match entry {
            Value::Set(set) => {
                set.insert(member.to_string());
                Ok(())
            }
            _ => Err(wrong_kind(key, "set")),
        }
    }

    async fn sscan_all(&mut self, key: &str) -> Result<Vec<String>> {
        match self.db().get(key) {
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(wrong_kind(key, "set")),
            None => Ok(Vec::new()),
        }
    }

    async fn srem(&mut self, key: &str, member: &str) -> Result<()> {
        let emptied = match self.db().get_mut(key) {
            Some(Value::Set(set)) => {
                set.remove(member);
                set.is_empty()
            }
            Some(_) => return Err(wrong_kind(key, "set")),
            None => false,
        };
        if emptied {
            self.db().remove(key);
        }
        Ok(())
    }

    async fn zadd(&mut self, key: &str, score: u64, member: &str) -> Result<()> {
        let entry = self
            .db()
            .entry(key.to_string())
            .or_insert_with(|| Value::ZSet(BTreeMap::new()));
        match entry {
            Value::ZSet(map) => {
                map.insert(member.to_string(), score);
                Ok(())
            }
            _ => Err(wrong_kind(key, "zset")),
        }
    }

    async fn zscan_all(&mut self, key: &str) -> Result<Vec<(String, u64)>> {
        match self.db().get(key) {
            Some(Value::ZSet(map)) => {
                let mut pairs: Vec<(String, u64)> =
                    map.iter().map(|(m, s)| (m.clone(), *s)).collect();
                // Rank order, ties broken by member like the live server.
                pairs.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
                Ok(pairs)
            }
            Some(_) => Err(wrong_kind(key, "zset")),
            None => Ok(Vec::new()),
        }
    }

    async fn zrem(&mut self, key: &str, member: &str) -> Result<()> {
        let emptied = match self.db().get_mut(key) {
            Some(Value::ZSet(map)) => {
                map.remove(member);
                map.is_empty()
            }
            Some(_) => return Err(wrong_kind(key, "zset")),
            None => false,
        };
        if emptied {
            self.db().remove(key);
        }
        Ok(())
    }

    async fn rpush(&mut self, key: &str, element: &str) -> Result<()> {
        let entry = self
            .db()
            .entry(key.to_string())
            .or_insert_with(|| Value::List(Vec::new()));
        match entry {
            Value::List(list) => {
                list.push(element.to_string());
                Ok(())
            }
            _ => Err(wrong_kind(key, "list")),
        }
    }

    async fn lrange(&mut self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        match self.db().get(key) {
            Some(Value::List(list)) => {
                let len = list.len() as i64;
                let mut start = if start < 0 { len + start } else { start };
                let mut stop = if stop < 0 { len + stop } else { stop };
                if start < 0 {
                    start = 0;
                }
                if start > stop || start >= len {
                    return Ok(Vec::new());
                }
                if stop >= len {
                    stop = len - 1;
                }
                Ok(list[start as usize..=stop as usize].to_vec())
            }
            Some(_) => Err(wrong_kind(key, "list")),
            None => Ok(Vec::new()),
        }
    }

    async fn llen(&mut self, key: &str) -> Result<i64> {
        match self.db().get(key) {
            Some(Value::List(list)) => Ok(list.len() as i64),
            Some(_) => Err(wrong_kind(key, "list")),
            None => Ok(0),
        }
    }

    async fn lrem(&mut self, key: &str, count: i64, element: &str) -> Result<()> {
        let emptied = match self.db().get_mut(key) {
            Some(Value::List(list)) => {
                if count == 0 {
                    list.retain(|e| e != element);
                } else if count > 0 {
                    let mut remaining = count;
                    list.retain(|e| {
                        if remaining > 0 && e == element {
                            remaining -= 1;
                            false
                        } else {
                            true
                        }
                    });
                } else {
                    let mut remaining = -count;
                    let mut keep: Vec<String> = Vec::with_capacity(list.len());
                    for e in list.iter().rev() {
                        if remaining > 0 && e == element {
                            remaining -= 1;
                        } else {
                            keep.push(e.clone());
                        }
                    }
                    keep.reverse();
                    *list = keep;
                }
                list.is_empty()
            }
            Some(_) => return Err(wrong_kind(key, "list")),
            None => false,
        };
        if emptied {
            self.db().remove(key);
        }
        Ok(())
    }

    async fn del(&mut self, key: &str) -> Result<()> {
        self.db().remove(key);
        Ok(())
    }

    async fn exists(&mut self, key: &str) -> Result<bool> {
        Ok(self.db().contains_key(key))
    }

    async fn select(&mut self, db: u32) -> Result<()> {
        self.current = db;
        Ok(())
    }
}
