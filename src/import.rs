//! Replays an interchange file against a store, record by record.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::codec::{self, ZSetElem};
use crate::error::Result;
use crate::record::Record;
use crate::store::Store;
use crate::types::{ElemOp, Kind, KeyOp};

/// Score assigned to sorted-set members that arrive without one.
const DEFAULT_SCORE: u64 = 1;

/// Counters from one import run.
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    /// Records whose key operation ran against the store.
    pub records_applied: u64,
    /// Records dropped: malformed lines plus warn-and-ignore operations.
    pub records_skipped: u64,
}

/// Reads the data file line by line and applies each record according
/// to its key operation, element operation and kind.
pub struct Importer<'a, S> {
    store: &'a mut S,
    data_path: PathBuf,
}

impl<'a, S: Store> Importer<'a, S> {
    pub fn new(store: &'a mut S, data_path: &Path) -> Self {
        Self {
            store,
            data_path: data_path.to_path_buf(),
        }
    }

    /// Apply every record in the data file.
    ///
    /// Malformed lines are skipped with a warning and the run keeps
    /// going; a payload that is not valid UTF-8 aborts the run, since
    /// it means the file itself is corrupt.
    pub async fn import_all(&mut self) -> Result<ImportSummary> {
        let file = File::open(&self.data_path).await?;
        let mut lines = BufReader::new(file).lines();
        let mut summary = ImportSummary::default();
        while let Some(line) = lines.next_line().await? {
            match Record::parse(&line) {
                Ok(record) => {
                    if self.apply(&record).await? {
                        summary.records_applied += 1;
                    } else {
                        summary.records_skipped += 1;
                    }
                }
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    warn!(error = %e, line = %line, "skipping malformed record");
                    summary.records_skipped += 1;
                }
            }
        }
        info!(
            applied = summary.records_applied,
            skipped = summary.records_skipped,
            "import finished"
        );
        Ok(summary)
    }

    /// Dispatch one record on its key operation. Returns whether the
    /// record was applied.
    async fn apply(&mut self, record: &Record) -> Result<bool> {
        debug!(key = %record.key, kind = %record.kind, key_op = %record.key_op, "applying record");
        match KeyOp::parse_str(&record.key_op) {
            Some(KeyOp::Merge) => self.apply_merge(record).await,
            Some(KeyOp::Replace) => {
                self.store.del(&record.key).await?;
                self.apply_merge(record).await
            }
            // Delete drops the whole key regardless of its kind.
            Some(KeyOp::Delete) => {
                self.store.del(&record.key).await?;
                Ok(true)
            }
            Some(KeyOp::Insert) => {
                if self.store.exists(&record.key).await? {
                    warn!(key = %record.key, "key already exists, insert skipped");
                    Ok(false)
                } else {
                    self.apply_merge(record).await
                }
            }
            Some(KeyOp::Compare) => {
                warn!(key = %record.key, "compare is not implemented, record ignored");
                Ok(false)
            }
            None => {
                warn!(key = %record.key, key_op = %record.key_op, "unknown key operation, record ignored");
                Ok(false)
            }
        }
    }

    async fn apply_merge(&mut self, record: &Record) -> Result<bool> {
        let Some(kind) = Kind::parse_str(&record.kind) else {
            warn!(key = %record.key, kind = %record.kind, "unknown key kind, record ignored");
            return Ok(false);
        };
        match kind {
            Kind::String => self.merge_string(record).await,
            Kind::Hash => self.merge_hash(record).await,
            Kind::List => self.merge_list(record).await,
            Kind::Set => self.merge_set(record).await,
            Kind::ZSet => self.merge_zset(record).await,
            Kind::ZIndex => self.merge_zindex(record).await,
            Kind::ZzIndex => {
                warn!(key = %record.key, "nested index records have no merge handler, record ignored");
                Ok(false)
            }
        }
    }

    /// Strings ignore the element operation: the payload is the value,
    /// even when it is empty.
    async fn merge_string(&mut self, record: &Record) -> Result<bool> {
        self.store.set(&record.key, &record.payload).await?;
        Ok(true)
    }

    async fn merge_hash(&mut self, record: &Record) -> Result<bool> {
        let op = ElemOp::parse_str(&record.elem_op);
        for (field, value) in codec::decode_hash(&record.payload) {
            match op {
                Some(ElemOp::Merge) | Some(ElemOp::Insert) => {
                    self.store.hset(&record.key, &field, &value).await?;
                }
                Some(ElemOp::Delete) => {
                    self.store.hdel(&record.key, &field).await?;
                }
                _ => {
                    warn!(key = %record.key, elem_op = %record.elem_op, field = %field, "unsupported element operation, element skipped");
                }
            }
        }
        Ok(true)
    }

    async fn merge_set(&mut self, record: &Record) -> Result<bool> {
        let op = ElemOp::parse_str(&record.elem_op);
        for member in codec::decode_set(&record.payload) {
            match op {
                Some(ElemOp::Merge) | Some(ElemOp::Insert) => {
                    self.store.sadd(&record.key, &member).await?;
                }
                Some(ElemOp::Delete) => {
                    self.store.srem(&record.key, &member).await?;
                }
                _ => {
                    warn!(key = %record.key, elem_op = %record.elem_op, member = %member, "unsupported element operation, element skipped");
                }
            }
        }
        Ok(true)
    }

    async fn merge_list(&mut self, record: &Record) -> Result<bool> {
        let elements = codec::decode_list(&record.payload);
        match ElemOp::parse_str(&record.elem_op) {
            Some(ElemOp::Merge) | Some(ElemOp::Insert) => {
                for element in &elements {
                    self.store.rpush(&record.key, element).await?;
                }
            }
            Some(ElemOp::Delete) => {
                // Removes every occurrence of each listed element.
                for element in &elements {
                    self.store.lrem(&record.key, 0, element).await?;
                }
            }
            _ => {
                warn!(key = %record.key, elem_op = %record.elem_op, "unsupported element operation, elements skipped");
            }
        }
        Ok(true)
    }

    async fn merge_zset(&mut self, record: &Record) -> Result<bool> {
        let op = ElemOp::parse_str(&record.elem_op);
        for elem in codec::decode_zset(&record.payload) {
            match op {
                Some(ElemOp::Merge) | Some(ElemOp::Insert) => match elem {
                    ZSetElem::Scored { member, score } => {
                        self.store.zadd(&record.key, score, &member).await?;
                    }
                    ZSetElem::Unscored { member } => {
                        self.store.zadd(&record.key, DEFAULT_SCORE, &member).await?;
                    }
                    ZSetElem::BadScore { member, .. } => {
                        warn!(key = %record.key, member = %member, "score is not an unsigned integer, element skipped");
                    }
                },
                Some(ElemOp::Delete) => {
                    self.store.zrem(&record.key, elem.member()).await?;
                }
                _ => {
                    warn!(key = %record.key, elem_op = %record.elem_op, member = %elem.member(), "unsupported element operation, element skipped");
                }
            }
        }
        Ok(true)
    }

    /// Index payloads always carry scores and never honor the element
    /// operation; members that lost their score are dropped.
    async fn merge_zindex(&mut self, record: &Record) -> Result<bool> {
        for elem in codec::decode_zset(&record.payload) {
            match elem {
                ZSetElem::Scored { member, score } => {
                    self.store.zadd(&record.key, score, &member).await?;
                }
                ZSetElem::Unscored { .. } => {}
                ZSetElem::BadScore { member, .. } => {
                    warn!(key = %record.key, member = %member, "score is not an unsigned integer, element skipped");
                }
            }
        }
        Ok(true)
    }
}
