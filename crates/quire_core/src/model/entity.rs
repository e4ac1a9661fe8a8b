//! Decoded entity references.
//!
//! Human-readable entity encodings are decoded outside core; the decoder
//! hands core one of these variants so callers match instead of casting.

use crate::model::address::{Address, AddressError};
use crate::model::record::{is_lower_hex, RecordId};

const NOTE_PREFIX: &str = "note:";

/// Tagged result of identifier decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    /// Author public key (lowercase hex).
    PublicKey(String),
    /// Addressable article reference.
    Address(Address),
    /// Single record by content hash.
    Note(RecordId),
}

impl EntityRef {
    /// Parses the raw, already-decoded forms:
    /// - a lowercase hex public key;
    /// - `note:<hex id>`;
    /// - a composite `kind:author:identifier` address.
    pub fn parse_raw(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        if is_lower_hex(trimmed) {
            return Ok(Self::PublicKey(trimmed.to_string()));
        }
        if let Some(id) = trimmed.strip_prefix(NOTE_PREFIX) {
            if is_lower_hex(id) {
                return Ok(Self::Note(id.to_string()));
            }
        }
        trimmed.parse::<Address>().map(Self::Address)
    }

    /// Subject (author) this entity names, when it names one.
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::PublicKey(pubkey) => Some(pubkey),
            Self::Address(address) => Some(&address.author),
            Self::Note(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PublicKey(_) => "public_key",
            Self::Address(_) => "address",
            Self::Note(_) => "note",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EntityRef;

    #[test]
    fn parses_each_raw_form() {
        assert_eq!(
            EntityRef::parse_raw(" abcd "),
            Ok(EntityRef::PublicKey("abcd".to_string()))
        );
        assert_eq!(
            EntityRef::parse_raw("note:ff00"),
            Ok(EntityRef::Note("ff00".to_string()))
        );
        let entity = EntityRef::parse_raw("30023:abcd:post").expect("address should parse");
        assert_eq!(entity.label(), "address");
        assert_eq!(entity.subject(), Some("abcd"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(EntityRef::parse_raw("npub with spaces").is_err());
    }
}
