//! Batch migration of keys between Redis-compatible stores.
//!
//! A manifest lists the keys to move; [`Ferry::export`] walks it and
//! writes one line per key to an interchange file, recursing through
//! index keys to pick up the keys their members name. [`Ferry::import`]
//! replays such a file against any store, honoring the per-record key
//! and element operations. The same file can be carried between
//! servers, databases or environments.
//!
//! ```no_run
//! use keyferry::{Ferry, RedisStore};
//!
//! #[tokio::main]
//! async fn main() -> keyferry::Result<()> {
//!     let store = RedisStore::connect("redis://127.0.0.1:6379/0").await?;
//!     let mut ferry = Ferry::new(store, "keys.csv", "keys.dat");
//!     let summary = ferry.export().await?;
//!     println!("wrote {} records", summary.records_written);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod export;
pub mod ferry;
pub mod import;
pub mod manifest;
pub mod record;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::{FerryError, Result};
pub use export::{ExportSummary, Exporter};
pub use ferry::Ferry;
pub use import::{ImportSummary, Importer};
pub use manifest::{Manifest, ManifestEntry};
pub use record::{Record, RecordError};
pub use store::{MemoryStore, RedisStore, Store};
pub use types::{ElemOp, KeyOp, Kind};
