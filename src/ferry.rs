//! High-level entry point tying manifest, export and import together.

use std::path::PathBuf;

use tracing::info;

use crate::error::Result;
use crate::export::{ExportSummary, Exporter};
use crate::import::{ImportSummary, Importer};
use crate::manifest::Manifest;
use crate::store::Store;

/// Owns a store connection plus the manifest and data file locations,
/// and runs whole migration passes over them.
pub struct Ferry<S> {
    store: S,
    manifest_path: PathBuf,
    data_path: PathBuf,
}

impl<S: Store> Ferry<S> {
    pub fn new(
        store: S,
        manifest_path: impl Into<PathBuf>,
        data_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            manifest_path: manifest_path.into(),
            data_path: data_path.into(),
        }
    }

    /// Export every manifest key into the data file.
    pub async fn export(&mut self) -> Result<ExportSummary> {
        let manifest = Manifest::from_file(&self.manifest_path)?;
        info!(
            entries = manifest.len(),
            manifest = %self.manifest_path.display(),
            "manifest loaded"
        );
        Exporter::new(&mut self.store, &self.data_path)
            .export_all(&manifest)
            .await
    }

    /// Replay the data file against the store.
    pub async fn import(&mut self) -> Result<ImportSummary> {
        Importer::new(&mut self.store, &self.data_path)
            .import_all()
            .await
    }

    /// Move the connection to another logical database.
    pub async fn switch_database(&mut self, db: u32) -> Result<()> {
        self.store.select(db).await
    }

    /// Export from the current database, then replay the file into
    /// `target_db` over the same connection.
    pub async fn sync(&mut self, target_db: u32) -> Result<(ExportSummary, ImportSummary)> {
        let exported = self.export().await?;
        self.switch_database(target_db).await?;
        let imported = self.import().await?;
        Ok((exported, imported))
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
