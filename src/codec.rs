//! Payload encoding and decoding per value kind.
//!
//! Payloads are flat strings: elements joined by [`FIELD_SEPARATOR`],
//! with kind-specific framing on top (single quotes around set members
//! and hash pairs, `member:score` pairs for sorted sets). The framing
//! characters are not escaped inside element bodies, so members
//! containing `'`, `:` or the separator itself do not survive a round
//! trip. That is the established interchange format and is preserved
//! here; producers are expected to keep such characters out of keys and
//! members.

/// Two-character token separating elements inside a payload.
pub const FIELD_SEPARATOR: &str = ",=";

/// Split a payload into element pieces.
///
/// Trailing empty pieces are dropped (sorted-set payloads end with a
/// separator); interior empty pieces are kept. An empty payload has no
/// elements at all.
pub fn split_elements(payload: &str) -> Vec<&str> {
    if payload.is_empty() {
        return Vec::new();
    }
    let mut pieces: Vec<&str> = payload.split(FIELD_SEPARATOR).collect();
    while pieces.last() == Some(&"") {
        pieces.pop();
    }
    pieces
}

/// Encode list elements: `e1 F e2 F … F eN`.
pub fn encode_list(elements: &[String]) -> String {
    elements.join(FIELD_SEPARATOR)
}

/// Decode a list payload; pieces are taken verbatim.
pub fn decode_list(payload: &str) -> Vec<String> {
    split_elements(payload)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Encode set members: `'e1' F 'e2' F …`.
pub fn encode_set(members: &[String]) -> String {
    let quoted: Vec<String> = members.iter().map(|m| format!("'{}'", m)).collect();
    quoted.join(FIELD_SEPARATOR)
}

/// Decode a set payload: strip all quote framing, then split.
pub fn decode_set(payload: &str) -> Vec<String> {
    let stripped = payload.replace('\'', "");
    split_elements(&stripped)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Encode hash pairs: `'k1:v1' F 'k2:v2' F …`.
pub fn encode_hash(pairs: &[(String, String)]) -> String {
    let quoted: Vec<String> = pairs
        .iter()
        .map(|(field, value)| format!("'{}:{}'", field, value))
        .collect();
    quoted.join(FIELD_SEPARATOR)
}

/// Decode a hash payload: strip all quote framing, split, then split
/// each piece on its first `:`. Pieces without a `:` are dropped.
pub fn decode_hash(payload: &str) -> Vec<(String, String)> {
    let stripped = payload.replace('\'', "");
    let mut pairs = Vec::new();
    for piece in split_elements(&stripped) {
        if let Some((field, value)) = piece.split_once(':') {
            pairs.push((field.to_string(), value.to_string()));
        }
    }
    pairs
}

/// Encode sorted-set pairs: `m1:s1 F m2:s2 F … F`.
///
/// Every pair is followed by the separator, the last one included; the
/// decoder discards the resulting trailing empty piece.
pub fn encode_zset(pairs: &[(String, u64)]) -> String {
    let mut payload = String::new();
    for (member, score) in pairs {
        payload.push_str(member);
        payload.push(':');
        payload.push_str(&score.to_string());
        payload.push_str(FIELD_SEPARATOR);
    }
    payload
}

/// One element of a decoded sorted-set payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZSetElem {
    /// `member:score` with a well-formed unsigned decimal score.
    Scored {
        /// Member name.
        member: String,
        /// Parsed score.
        score: u64,
    },
    /// A piece with no usable score part once trailing empty parts are
    /// dropped; the member is everything before the first `:` and the
    /// import-time default score applies.
    Unscored {
        /// Member name (first `:`-delimited part).
        member: String,
    },
    /// A member and score part where the score was not an unsigned
    /// decimal.
    BadScore {
        /// Member name.
        member: String,
        /// The raw score text that failed to parse.
        raw: String,
    },
}

impl ZSetElem {
    /// The member name, whatever the score situation.
    pub fn member(&self) -> &str {
        match self {
            ZSetElem::Scored { member, .. }
            | ZSetElem::Unscored { member }
            | ZSetElem::BadScore { member, .. } => member,
        }
    }
}

/// Decode a sorted-set payload into scored elements.
pub fn decode_zset(payload: &str) -> Vec<ZSetElem> {
    split_elements(payload)
        .into_iter()
        .map(parse_zset_piece)
        .collect()
}

fn parse_zset_piece(piece: &str) -> ZSetElem {
    let mut parts: Vec<&str> = piece.split(':').collect();
    // Trailing empty parts are dropped, same as trailing empty pieces at
    // the payload split: "m:" is a scoreless member, not an empty score.
    while parts.len() > 1 && parts.last() == Some(&"") {
        parts.pop();
    }
    if parts.len() == 2 {
        match parts[1].parse::<u64>() {
            Ok(score) => ZSetElem::Scored {
                member: parts[0].to_string(),
                score,
            },
            Err(_) => ZSetElem::BadScore {
                member: parts[0].to_string(),
                raw: parts[1].to_string(),
            },
        }
    } else {
        ZSetElem::Unscored {
            member: parts[0].to_string(),
        }
    }
}
