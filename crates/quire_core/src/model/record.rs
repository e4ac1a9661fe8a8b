//! Record domain model.
//!
//! # Responsibility
//! - Define the immutable, content-addressed unit replicated across relays.
//! - Provide tag lookup helpers shared by article/highlight projections.
//!
//! # Invariants
//! - `id` is the dedup identity; two records with the same `id` are identical.
//! - Records are never mutated after construction by core code.
//! - Every tag carries at least a key element.

use crate::model::address::Address;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Content hash identifying one record.
pub type RecordId = String;

/// Author-assigned logical timestamp in unix seconds.
pub type Timestamp = i64;

/// Integer discriminator of a record.
pub type Kind = u32;

/// Earliest possible timestamp; the boundary of a never-synced subject.
pub const TIMESTAMP_MIN: Timestamp = 0;

/// Long-form article kind.
pub const KIND_ARTICLE: Kind = 30023;

/// Reader highlight kind.
pub const KIND_HIGHLIGHT: Kind = 9802;

/// Per-author article identifier tag key.
pub const TAG_IDENTIFIER: &str = "d";

/// Composite back-reference tag key.
pub const TAG_ADDRESS: &str = "a";

/// One ordered tag: key followed by zero or more values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub Vec<String>);

impl Tag {
    /// Builds a tag from a key and its values.
    pub fn new<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts = vec![key.into()];
        parts.extend(values.into_iter().map(Into::into));
        Self(parts)
    }

    pub fn key(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// First value after the key, when present.
    pub fn value(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        self.0.get(1..).unwrap_or(&[])
    }
}

/// Validation failures for records entering the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    InvalidId(String),
    InvalidAuthor(String),
    EmptyTag { position: usize },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(value) => write!(f, "record id must be lowercase hex: `{value}`"),
            Self::InvalidAuthor(value) => {
                write!(f, "record author must be lowercase hex: `{value}`")
            }
            Self::EmptyTag { position } => write!(f, "tag at position {position} has no key"),
        }
    }
}

impl Error for RecordValidationError {}

/// Immutable network record.
///
/// Field names follow the wire shape (`pubkey` for the author) so decoded
/// records can be deserialized directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(rename = "pubkey")]
    pub author: String,
    pub created_at: Timestamp,
    pub kind: Kind,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub content: String,
    /// Signature carried through verbatim; verification happens upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl Record {
    /// Returns the first value of the first tag named `key`.
    pub fn first_tag_value(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.key() == Some(key))
            .and_then(Tag::value)
    }

    /// Returns the first value of every tag named `key`, in tag order.
    pub fn tag_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |tag| tag.key() == Some(key))
            .filter_map(Tag::value)
    }

    /// Per-author identifier (`d` tag); `None` when missing or empty.
    pub fn identifier(&self) -> Option<&str> {
        self.first_tag_value(TAG_IDENTIFIER)
            .filter(|value| !value.is_empty())
    }

    /// Composite address of this record, when it carries an identifier.
    pub fn address(&self) -> Option<Address> {
        let identifier = self.identifier()?;
        Some(Address::new(self.kind, self.author.clone(), identifier))
    }

    /// Checks the structural shape required before persistence.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if !is_lower_hex(&self.id) {
            return Err(RecordValidationError::InvalidId(self.id.clone()));
        }
        if !is_lower_hex(&self.author) {
            return Err(RecordValidationError::InvalidAuthor(self.author.clone()));
        }
        if let Some(position) = self.tags.iter().position(|tag| tag.key().is_none()) {
            return Err(RecordValidationError::EmptyTag { position });
        }
        Ok(())
    }
}

/// Returns whether `value` is a non-empty lowercase hex string.
pub fn is_lower_hex(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
