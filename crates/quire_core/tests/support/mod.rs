#![allow(dead_code)]

use quire_core::{
    Aggregator, Record, RecordFilter, RelayClient, RelayError, RelayErrorKind, RelayResult, Tag,
    KIND_ARTICLE, KIND_HIGHLIGHT,
};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const ALICE: &str = "a11ce";
pub const BOB: &str = "b0b";

/// Deterministic 64-char hex id.
pub fn hex_id(seed: u32) -> String {
    format!("{seed:064x}")
}

pub fn article(id: u32, author: &str, identifier: &str, created_at: i64, content: &str) -> Record {
    Record {
        id: hex_id(id),
        author: author.to_string(),
        created_at,
        kind: KIND_ARTICLE,
        tags: vec![
            Tag::new("d", [identifier]),
            Tag::new("title", [format!("Title {identifier}")]),
        ],
        content: content.to_string(),
        sig: None,
    }
}

pub fn highlight(id: u32, author: &str, target: &str, created_at: i64, excerpt: &str) -> Record {
    Record {
        id: hex_id(id),
        author: author.to_string(),
        created_at,
        kind: KIND_HIGHLIGHT,
        tags: vec![Tag::new("a", [target])],
        content: excerpt.to_string(),
        sig: None,
    }
}

pub fn address_of(author: &str, identifier: &str) -> String {
    format!("{KIND_ARTICLE}:{author}:{identifier}")
}

enum Behavior {
    Answer,
    Fail(RelayErrorKind),
    Panic,
}

/// In-memory relay answering from a fixed record set.
pub struct ScriptedRelay {
    endpoint: String,
    records: Mutex<Vec<Record>>,
    delay: Option<Duration>,
    behavior: Behavior,
    apply_filter: bool,
    seen: Mutex<Vec<RecordFilter>>,
}

impl ScriptedRelay {
    pub fn new(endpoint: &str, records: Vec<Record>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            records: Mutex::new(records),
            delay: None,
            behavior: Behavior::Answer,
            apply_filter: true,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self, kind: RelayErrorKind) -> Self {
        self.behavior = Behavior::Fail(kind);
        self
    }

    pub fn panicking(mut self) -> Self {
        self.behavior = Behavior::Panic;
        self
    }

    /// Returns every held record whatever the filter says.
    pub fn ignoring_filter(mut self) -> Self {
        self.apply_filter = false;
        self
    }

    pub fn publish(&self, record: Record) {
        self.records.lock().unwrap().push(record);
    }

    pub fn seen_filters(&self) -> Vec<RecordFilter> {
        self.seen.lock().unwrap().clone()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl RelayClient for ScriptedRelay {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn query(&self, filter: &RecordFilter) -> RelayResult<Vec<Record>> {
        self.seen.lock().unwrap().push(filter.clone());
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        match self.behavior {
            Behavior::Answer => {}
            Behavior::Fail(kind) => {
                return Err(RelayError::new(&self.endpoint, kind, "scripted failure"))
            }
            Behavior::Panic => panic!("scripted relay panic"),
        }

        let records = self.records.lock().unwrap();
        let mut matched: Vec<Record> = records
            .iter()
            .filter(|record| !self.apply_filter || filter.matches(record))
            .cloned()
            .collect();
        if let Some(limit) = filter.limit {
            matched.truncate(limit as usize);
        }
        Ok(matched)
    }
}

pub fn aggregator_of(relays: &[Arc<ScriptedRelay>]) -> Aggregator {
    Aggregator::new(
        relays
            .iter()
            .map(|relay| Arc::clone(relay) as Arc<dyn RelayClient>)
            .collect(),
    )
}
