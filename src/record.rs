//! Interchange record framing.
//!
//! One record per line: `key,kind,keyOp,elemOp,base64(payload)` with an
//! LF terminator. The first four fields are bare ASCII tokens; the fifth
//! is standard-alphabet base64 and therefore never contains a comma, so
//! a left-to-right split limited to five pieces always recovers the
//! frame.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Errors produced while decoding an interchange line.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The line split into fewer than five comma-delimited fields.
    #[error("expected 5 fields, found {0}")]
    TooFewFields(usize),

    /// The payload field was not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded payload was not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl RecordError {
    /// Whether this error aborts the import pass.
    ///
    /// Short lines and bad base64 are format errors: the record is
    /// warned about and skipped. A payload that is not UTF-8 violates
    /// the encoding mandate and stops the pass.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RecordError::Utf8(_))
    }
}

/// One parsed line of the interchange file.
///
/// `kind`, `key_op`, and `elem_op` stay raw strings so unknown tokens
/// survive until dispatch, where they are warned about and skipped.
/// `payload` holds the decoded text, not the base64 form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Key the record applies to.
    pub key: String,
    /// Kind token (`string`, `hash`, ...).
    pub kind: String,
    /// Key-level policy token (`MRG`, `RPL`, ...).
    pub key_op: String,
    /// Element-level policy token.
    pub elem_op: String,
    /// Decoded payload text.
    pub payload: String,
}

impl Record {
    /// Build a record from its parts.
    pub fn new(key: &str, kind: &str, key_op: &str, elem_op: &str, payload: &str) -> Self {
        Self {
            key: key.to_string(),
            kind: kind.to_string(),
            key_op: key_op.to_string(),
            elem_op: elem_op.to_string(),
            payload: payload.to_string(),
        }
    }

    /// Render the record as one interchange line, newline included.
    pub fn to_line(&self) -> String {
        let encoded = STANDARD.encode(self.payload.as_bytes());
        format!(
            "{},{},{},{},{}\n",
            self.key, self.kind, self.key_op, self.elem_op, encoded
        )
    }

    /// Parse one line (without its trailing newline) into a record.
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        let parts: Vec<&str> = line.splitn(5, ',').collect();
        if parts.len() < 5 {
            return Err(RecordError::TooFewFields(parts.len()));
        }
        let raw = STANDARD.decode(parts[4])?;
        let payload = String::from_utf8(raw)?;
        Ok(Self {
            key: parts[0].to_string(),
            kind: parts[1].to_string(),
            key_op: parts[2].to_string(),
            elem_op: parts[3].to_string(),
            payload,
        })
    }
}
