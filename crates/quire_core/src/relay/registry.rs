//! In-process registry of relay clients.

use crate::relay::aggregator::Aggregator;
use crate::relay::client::RelayClient;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Relay registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayRegistryError {
    InvalidEndpoint(String),
    DuplicateEndpoint(String),
    EndpointNotFound(String),
}

impl Display for RelayRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEndpoint(value) => write!(f, "relay endpoint is invalid: {value}"),
            Self::DuplicateEndpoint(value) => {
                write!(f, "relay endpoint already registered: {value}")
            }
            Self::EndpointNotFound(value) => write!(f, "relay endpoint not found: {value}"),
        }
    }
}

impl Error for RelayRegistryError {}

/// Relay clients keyed by normalized endpoint.
#[derive(Default)]
pub struct RelayRegistry {
    relays: BTreeMap<String, Arc<dyn RelayClient>>,
}

impl RelayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one relay client under its normalized endpoint.
    pub fn register(&mut self, relay: Arc<dyn RelayClient>) -> Result<(), RelayRegistryError> {
        let endpoint = normalize_endpoint(relay.endpoint());
        if !is_valid_endpoint(&endpoint) {
            return Err(RelayRegistryError::InvalidEndpoint(endpoint));
        }
        if self.relays.contains_key(endpoint.as_str()) {
            return Err(RelayRegistryError::DuplicateEndpoint(endpoint));
        }

        self.relays.insert(endpoint, relay);
        Ok(())
    }

    pub fn unregister(&mut self, endpoint: &str) -> Result<(), RelayRegistryError> {
        let normalized = normalize_endpoint(endpoint);
        match self.relays.remove(normalized.as_str()) {
            Some(_) => Ok(()),
            None => Err(RelayRegistryError::EndpointNotFound(normalized)),
        }
    }

    pub fn len(&self) -> usize {
        self.relays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    /// Returns sorted endpoints.
    pub fn endpoints(&self) -> Vec<String> {
        self.relays.keys().cloned().collect()
    }

    pub fn get(&self, endpoint: &str) -> Option<Arc<dyn RelayClient>> {
        self.relays.get(normalize_endpoint(endpoint).as_str()).cloned()
    }

    /// Builds an aggregator over every registered relay, in endpoint order.
    pub fn aggregator(&self) -> Aggregator {
        Aggregator::new(self.relays.values().cloned().collect())
    }
}

/// Trims surrounding whitespace and trailing slashes.
pub fn normalize_endpoint(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

/// Accepts `ws://` and `wss://` URLs with a host part and no whitespace.
pub fn is_valid_endpoint(value: &str) -> bool {
    let rest = value
        .strip_prefix("wss://")
        .or_else(|| value.strip_prefix("ws://"));
    match rest {
        Some(host) => !host.is_empty() && !host.chars().any(char::is_whitespace),
        None => false,
    }
}
