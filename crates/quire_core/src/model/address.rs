//! Composite article address (`kind:author:identifier`).
//!
//! # Invariants
//! - The string form is a wire-level contract and must round-trip
//!   byte-for-byte between an article and a highlight back-reference.
//! - The identifier is everything after the second `:` and may itself
//!   contain colons.

use crate::model::record::{is_lower_hex, Kind};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Failure to parse a composite address string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Fewer than three `:`-separated components.
    MissingComponent(String),
    InvalidKind(String),
    InvalidAuthor(String),
    EmptyIdentifier(String),
}

impl Display for AddressError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingComponent(raw) => {
                write!(f, "malformed reference `{raw}`: expected kind:author:identifier")
            }
            Self::InvalidKind(raw) => write!(f, "malformed reference `{raw}`: invalid kind"),
            Self::InvalidAuthor(raw) => write!(f, "malformed reference `{raw}`: invalid author"),
            Self::EmptyIdentifier(raw) => {
                write!(f, "malformed reference `{raw}`: empty identifier")
            }
        }
    }
}

impl Error for AddressError {}

/// Stable logical reference to the latest version of an author's article.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    pub kind: Kind,
    pub author: String,
    pub identifier: String,
}

impl Address {
    pub fn new(kind: Kind, author: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            author: author.into(),
            identifier: identifier.into(),
        }
    }

    /// Canonical string form used by `a` tags.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.kind, self.author, self.identifier)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.splitn(3, ':');
        let (Some(kind), Some(author), Some(identifier)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(AddressError::MissingComponent(raw.to_string()));
        };

        let kind = kind
            .parse::<Kind>()
            .map_err(|_| AddressError::InvalidKind(raw.to_string()))?;
        if !is_lower_hex(author) {
            return Err(AddressError::InvalidAuthor(raw.to_string()));
        }
        if identifier.is_empty() {
            return Err(AddressError::EmptyIdentifier(raw.to_string()));
        }

        Ok(Self::new(kind, author, identifier))
    }
}
