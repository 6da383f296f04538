//! Manifest-driven export of live keys into the interchange file.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::record::Record;
use crate::store::Store;
use crate::types::Kind;

/// Elements pulled per LRANGE call when draining a list.
const LIST_BATCH: i64 = 100;

/// Counters from one export run.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// Records appended to the data file, children included.
    pub records_written: u64,
    /// Manifest entries dropped for an unknown kind token.
    pub entries_skipped: u64,
}

/// Walks a manifest and appends one record per key to the data file,
/// recursing through index keys to capture the keys they name.
pub struct Exporter<'a, S> {
    store: &'a mut S,
    data_path: PathBuf,
}

impl<'a, S: Store> Exporter<'a, S> {
    pub fn new(store: &'a mut S, data_path: &Path) -> Self {
        Self {
            store,
            data_path: data_path.to_path_buf(),
        }
    }

    /// Export every manifest entry, truncating any previous data file.
    pub async fn export_all(&mut self, manifest: &Manifest) -> Result<ExportSummary> {
        File::create(&self.data_path).await?;
        let mut summary = ExportSummary::default();
        for entry in manifest.entries() {
            match Kind::parse_str(&entry.kind) {
                Some(kind) => {
                    summary.records_written += self
                        .export_key(
                            &entry.key,
                            kind,
                            &entry.key_op,
                            &entry.elem_op,
                            &entry.prefix,
                            &entry.suffix,
                        )
                        .await?;
                }
                None => {
                    warn!(key = %entry.key, kind = %entry.kind, "unknown key kind, skipping entry");
                    summary.entries_skipped += 1;
                }
            }
        }
        info!(
            records = summary.records_written,
            skipped = summary.entries_skipped,
            "export finished"
        );
        Ok(summary)
    }

    /// Export one key. Index kinds write their own record first, then
    /// recurse into the keys their members name, so an import replays
    /// the index before its children.
    async fn export_key(
        &mut self,
        name: &str,
        kind: Kind,
        key_op: &str,
        elem_op: &str,
        prefix: &str,
        suffix: &str,
    ) -> Result<u64> {
        debug!(key = %name, kind = %kind, "exporting key");
        match kind {
            Kind::String => {
                let value = self.store.get(name).await?.unwrap_or_default();
                self.append(name, kind, key_op, elem_op, &value).await?;
                Ok(1)
            }
            Kind::Hash => {
                let pairs = self.store.hscan_all(name).await?;
                self.append(name, kind, key_op, elem_op, &codec::encode_hash(&pairs))
                    .await?;
                Ok(1)
            }
            Kind::List => {
                let elements = self.read_list(name).await?;
                self.append(name, kind, key_op, elem_op, &codec::encode_list(&elements))
                    .await?;
                Ok(1)
            }
            Kind::Set => {
                let members = self.store.sscan_all(name).await?;
                self.append(name, kind, key_op, elem_op, &codec::encode_set(&members))
                    .await?;
                Ok(1)
            }
            Kind::ZSet => {
                let pairs = self.store.zscan_all(name).await?;
                self.append(name, kind, key_op, elem_op, &codec::encode_zset(&pairs))
                    .await?;
                Ok(1)
            }
            Kind::ZIndex => {
                let pairs = self.store.zscan_all(name).await?;
                self.append(name, kind, key_op, elem_op, &codec::encode_zset(&pairs))
                    .await?;
                let mut written = 1;
                for (member, _) in &pairs {
                    let child = format!("{}{}{}", prefix, member, suffix);
                    written += Box::pin(self.export_key(
                        &child,
                        Kind::Hash,
                        key_op,
                        elem_op,
                        prefix,
                        suffix,
                    ))
                    .await?;
                }
                Ok(written)
            }
            Kind::ZzIndex => {
                let pairs = self.store.zscan_all(name).await?;
                self.append(name, kind, key_op, elem_op, &codec::encode_zset(&pairs))
                    .await?;
                let mut written = 1;
                for (member, _) in &pairs {
                    // The nested index names its own children directly,
                    // so the decoration stops at this level.
                    let child = format!("{}{}{}", prefix, member, suffix);
                    written += Box::pin(self.export_key(
                        &child,
                        Kind::ZIndex,
                        key_op,
                        elem_op,
                        "",
                        "",
                    ))
                    .await?;
                }
                Ok(written)
            }
        }
    }

    async fn read_list(&mut self, key: &str) -> Result<Vec<String>> {
        let len = self.store.llen(key).await?;
        let mut elements = Vec::with_capacity(len.max(0) as usize);
        let mut start = 0;
        while start < len {
            let stop = (start + LIST_BATCH - 1).min(len - 1);
            elements.extend(self.store.lrange(key, start, stop).await?);
            start += LIST_BATCH;
        }
        Ok(elements)
    }

    async fn append(
        &mut self,
        key: &str,
        kind: Kind,
        key_op: &str,
        elem_op: &str,
        payload: &str,
    ) -> Result<()> {
        let record = Record::new(key, kind.as_str(), key_op, elem_op, payload);
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.data_path)
            .await?;
        file.write_all(record.to_line().as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
