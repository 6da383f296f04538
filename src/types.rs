//! Value kinds and per-entry policies.
//!
//! Manifest rows and interchange records carry these as bare ASCII
//! tokens. They are parsed lazily at dispatch points so an unknown
//! token can be warned about and skipped instead of failing the pass.

use std::fmt;

/// The value schema of a stored key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Plain string value.
    String,
    /// Field/value map.
    Hash,
    /// Ordered list.
    List,
    /// Unordered member set.
    Set,
    /// Sorted set with unsigned integer scores.
    ZSet,
    /// Sorted set whose members name hash keys to export recursively.
    ZIndex,
    /// Sorted set whose members name zindex keys, one level above
    /// [`Kind::ZIndex`].
    ZzIndex,
}

impl Kind {
    /// Parse a wire token into a `Kind`, if recognised.
    pub fn parse_str(token: &str) -> Option<Self> {
        Some(match token {
            "string" => Kind::String,
            "hash" => Kind::Hash,
            "list" => Kind::List,
            "set" => Kind::Set,
            "zset" => Kind::ZSet,
            "zindex" => Kind::ZIndex,
            "zzindex" => Kind::ZzIndex,
            _ => return None,
        })
    }

    /// The wire token for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Hash => "hash",
            Kind::List => "list",
            Kind::Set => "set",
            Kind::ZSet => "zset",
            Kind::ZIndex => "zindex",
            Kind::ZzIndex => "zzindex",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level policy applied to a key as a whole during import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyOp {
    /// Insert or overwrite elements, keeping the rest of the key.
    Merge,
    /// Delete the key, then merge.
    Replace,
    /// Delete the key.
    Delete,
    /// Merge only if the key does not exist yet.
    Insert,
    /// Reserved: compare source and target. Currently a warned no-op.
    Compare,
}

impl KeyOp {
    /// Parse a wire token into a `KeyOp`, if recognised.
    pub fn parse_str(token: &str) -> Option<Self> {
        Some(match token {
            "MRG" => KeyOp::Merge,
            "RPL" => KeyOp::Replace,
            "DEL" => KeyOp::Delete,
            "INS" => KeyOp::Insert,
            "CMP" => KeyOp::Compare,
            _ => return None,
        })
    }

    /// The wire token for this policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyOp::Merge => "MRG",
            KeyOp::Replace => "RPL",
            KeyOp::Delete => "DEL",
            KeyOp::Insert => "INS",
            KeyOp::Compare => "CMP",
        }
    }
}

impl fmt::Display for KeyOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy applied per element within a collection value.
///
/// `Insert` is not distinguished from `Merge` at the element level;
/// `Replace` and `Compare` hit the warn arm of every dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElemOp {
    /// Insert or overwrite the element.
    Merge,
    /// Same as `Merge` in the current design.
    Insert,
    /// Remove the element.
    Delete,
    /// Unimplemented per-element policy.
    Replace,
    /// Unimplemented per-element policy.
    Compare,
}

impl ElemOp {
    /// Parse a wire token into an `ElemOp`, if recognised.
    pub fn parse_str(token: &str) -> Option<Self> {
        Some(match token {
            "MRG" => ElemOp::Merge,
            "RPL" => ElemOp::Replace,
            "DEL" => ElemOp::Delete,
            "INS" => ElemOp::Insert,
            "CMP" => ElemOp::Compare,
            _ => return None,
        })
    }

    /// The wire token for this policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElemOp::Merge => "MRG",
            ElemOp::Replace => "RPL",
            ElemOp::Delete => "DEL",
            ElemOp::Insert => "INS",
            ElemOp::Compare => "CMP",
        }
    }
}

impl fmt::Display for ElemOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tokens_round_trip() {
        for kind in [
            Kind::String,
            Kind::Hash,
            Kind::List,
            Kind::Set,
            Kind::ZSet,
            Kind::ZIndex,
            Kind::ZzIndex,
        ] {
            assert_eq!(Kind::parse_str(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn unknown_kind_is_none() {
        assert_eq!(Kind::parse_str("stream"), None);
        assert_eq!(Kind::parse_str(""), None);
        assert_eq!(Kind::parse_str("String"), None);
    }

    #[test]
    fn key_op_tokens_round_trip() {
        for op in [
            KeyOp::Merge,
            KeyOp::Replace,
            KeyOp::Delete,
            KeyOp::Insert,
            KeyOp::Compare,
        ] {
            assert_eq!(KeyOp::parse_str(op.as_str()), Some(op));
        }
    }

    #[test]
    fn blank_op_is_none() {
        // Blank element ops are defaulted to MRG by the manifest reader,
        // never here.
        assert_eq!(KeyOp::parse_str(""), None);
        assert_eq!(ElemOp::parse_str(""), None);
    }

    #[test]
    fn ops_are_case_sensitive() {
        assert_eq!(KeyOp::parse_str("mrg"), None);
        assert_eq!(ElemOp::parse_str("del"), None);
    }
}
