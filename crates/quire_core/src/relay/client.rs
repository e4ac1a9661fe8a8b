//! Relay client contract.
//!
//! Concrete network clients live outside core. A client performs one
//! blocking round-trip per `query` call and owns its own timeout.

use crate::model::filter::RecordFilter;
use crate::model::record::Record;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RelayResult<T> = Result<T, RelayError>;

/// Failure category of one relay dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayErrorKind {
    Connect,
    Timeout,
    /// Response could not be decoded into records.
    Malformed,
    /// Relay closed the subscription before completing.
    Closed,
    Other,
}

impl RelayErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Malformed => "malformed",
            Self::Closed => "closed",
            Self::Other => "other",
        }
    }
}

/// One relay was unavailable for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayError {
    pub endpoint: String,
    pub kind: RelayErrorKind,
    pub message: String,
}

impl RelayError {
    pub fn new(
        endpoint: impl Into<String>,
        kind: RelayErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            kind,
            message: message.into(),
        }
    }
}

impl Display for RelayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "relay {} unavailable ({}): {}",
            self.endpoint,
            self.kind.as_str(),
            self.message
        )
    }
}

impl Error for RelayError {}

/// Per-endpoint relay connection.
pub trait RelayClient: Send + Sync {
    /// Endpoint URL identifying this relay in logs and the registry.
    fn endpoint(&self) -> &str;

    /// Returns the finite batch of records the relay holds for `filter`.
    fn query(&self, filter: &RecordFilter) -> RelayResult<Vec<Record>>;
}
