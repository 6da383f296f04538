//! Manifest parsing.
//!
//! The manifest is a UTF-8 CSV with columns
//! `keyName, kind, keyOp, elemOp, keyPrefix, keySuffix`. Only the first
//! three are required. Rows whose first field starts with `#` are
//! comments; rows with fewer than three fields are skipped. Entry order
//! is preserved: the exporter appends records in manifest order.

use std::path::Path;

use crate::error::Result;

/// One row of the manifest: a key to process and its policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Key name to export.
    pub key: String,
    /// Kind token.
    pub kind: String,
    /// Key-level policy token.
    pub key_op: String,
    /// Element-level policy token; blank defaults to `MRG`.
    pub elem_op: String,
    /// Prefix applied to index members when deriving child key names.
    pub prefix: String,
    /// Suffix applied to index members when deriving child key names.
    pub suffix: String,
}

impl Default for ManifestEntry {
    fn default() -> Self {
        Self {
            key: String::new(),
            kind: String::new(),
            key_op: "MRG".to_string(),
            elem_op: "MRG".to_string(),
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

/// An ordered list of manifest entries.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path.as_ref())?;

        let mut entries = Vec::new();
        for row in reader.records() {
            let row = row?;
            if let Some(entry) = parse_row(&row) {
                entries.push(entry);
            }
        }
        Ok(Self { entries })
    }

    /// Build a manifest from entries directly.
    pub fn from_entries(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    /// The entries, in manifest order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Turn one CSV row into an entry, or `None` if the row is skipped.
fn parse_row(row: &csv::StringRecord) -> Option<ManifestEntry> {
    let key = row.get(0)?;
    if key.starts_with('#') {
        return None;
    }
    if row.len() < 3 {
        return None;
    }
    let elem_op = match row.get(3) {
        Some(op) if !op.is_empty() => op.to_string(),
        _ => "MRG".to_string(),
    };
    Some(ManifestEntry {
        key: key.to_string(),
        kind: row.get(1).unwrap_or("").to_string(),
        key_op: row.get(2).unwrap_or("").to_string(),
        elem_op,
        prefix: row.get(4).unwrap_or("").to_string(),
        suffix: row.get(5).unwrap_or("").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn manifest_from(text: &str) -> Manifest {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        Manifest::from_file(file.path()).unwrap()
    }

    #[test]
    fn full_row_parses_all_columns() {
        let manifest = manifest_from("I,zindex,MRG,DEL,pfx_,_sfx\n");
        assert_eq!(
            manifest.entries(),
            &[ManifestEntry {
                key: "I".to_string(),
                kind: "zindex".to_string(),
                key_op: "MRG".to_string(),
                elem_op: "DEL".to_string(),
                prefix: "pfx_".to_string(),
                suffix: "_sfx".to_string(),
            }]
        );
    }

    #[test]
    fn three_field_row_gets_defaults() {
        let manifest = manifest_from("greet,string,MRG\n");
        let entry = &manifest.entries()[0];
        assert_eq!(entry.elem_op, "MRG");
        assert_eq!(entry.prefix, "");
        assert_eq!(entry.suffix, "");
    }

    #[test]
    fn blank_elem_op_defaults_to_merge() {
        let manifest = manifest_from("h,hash,RPL,,p,s\n");
        let entry = &manifest.entries()[0];
        assert_eq!(entry.elem_op, "MRG");
        assert_eq!(entry.prefix, "p");
    }

    #[test]
    fn comment_rows_are_skipped() {
        let manifest = manifest_from("# heading,string,MRG\nk,set,MRG\n#k2,set,MRG\n");
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.entries()[0].key, "k");
    }

    #[test]
    fn short_rows_are_skipped() {
        let manifest = manifest_from("lonely\nk,set\nok,set,MRG\n");
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.entries()[0].key, "ok");
    }

    #[test]
    fn order_is_preserved() {
        let manifest = manifest_from("b,set,MRG\na,set,MRG\nc,set,MRG\n");
        let keys: Vec<&str> = manifest.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn quoted_fields_keep_embedded_commas() {
        let manifest = manifest_from("\"k,1\",string,MRG\n");
        assert_eq!(manifest.entries()[0].key, "k,1");
    }

    #[test]
    fn empty_file_is_empty_manifest() {
        let manifest = manifest_from("");
        assert!(manifest.is_empty());
    }
}
