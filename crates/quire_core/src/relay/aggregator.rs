//! Concurrent relay fan-out with dedup by record id.
//!
//! # Responsibility
//! - Dispatch one filter to every relay on its own worker thread.
//! - Merge the union of successful responses into one deduplicated set.
//!
//! # Invariants
//! - One relay's failure never fails the fetch; it contributes nothing.
//! - `fetch` returns only after every dispatch resolved or the deadline hit.
//! - No two output records share an `id`.
//! - Records that do not satisfy the filter are dropped.
//! - The dedup map is owned by the calling thread; workers only send.

use crate::model::filter::RecordFilter;
use crate::model::record::{Record, RecordId};
use crate::relay::client::{RelayClient, RelayErrorKind, RelayResult};
use crossbeam::channel::{self, RecvTimeoutError};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

struct Dispatch {
    index: usize,
    result: RelayResult<Vec<Record>>,
    elapsed: Duration,
}

/// Fans filters out to a fixed set of relays.
#[derive(Clone, Default)]
pub struct Aggregator {
    relays: Vec<Arc<dyn RelayClient>>,
}

impl Aggregator {
    pub fn new(relays: Vec<Arc<dyn RelayClient>>) -> Self {
        Self { relays }
    }

    pub fn relay_count(&self) -> usize {
        self.relays.len()
    }

    /// Queries every relay and waits for all of them.
    pub fn fetch(&self, filter: &RecordFilter) -> Vec<Record> {
        self.fetch_inner(filter, None)
    }

    /// Queries every relay, abandoning dispatches still running at `deadline`.
    pub fn fetch_until(&self, filter: &RecordFilter, deadline: Instant) -> Vec<Record> {
        self.fetch_inner(filter, Some(deadline))
    }

    fn fetch_inner(&self, filter: &RecordFilter, deadline: Option<Instant>) -> Vec<Record> {
        let started_at = Instant::now();
        if self.relays.is_empty() {
            debug!("event=relay_fetch module=relay status=skipped reason=no_relays");
            return Vec::new();
        }

        let (tx, rx) = channel::unbounded::<Dispatch>();
        let mut pending = BTreeSet::new();
        for (index, relay) in self.relays.iter().enumerate() {
            let relay = Arc::clone(relay);
            let filter = filter.clone();
            let tx = tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("relay-fetch-{index}"))
                .spawn(move || {
                    let dispatched_at = Instant::now();
                    let result = relay.query(&filter);
                    // Receiver may be gone after a deadline; late results are dropped.
                    let _ = tx.send(Dispatch {
                        index,
                        result,
                        elapsed: dispatched_at.elapsed(),
                    });
                });

            match spawned {
                Ok(_) => {
                    pending.insert(index);
                }
                Err(err) => warn!(
                    "event=relay_unavailable module=relay endpoint={} reason=spawn_failed error={}",
                    self.relays[index].endpoint(),
                    err
                ),
            }
        }
        drop(tx);

        let mut merged: BTreeMap<RecordId, Record> = BTreeMap::new();
        while !pending.is_empty() {
            let received = match deadline {
                Some(deadline) => rx.recv_deadline(deadline),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            let dispatch = match received {
                Ok(dispatch) => dispatch,
                Err(RecvTimeoutError::Timeout) => {
                    for index in &pending {
                        warn!(
                            "event=relay_unavailable module=relay endpoint={} kind={} reason=deadline_expired",
                            self.relays[*index].endpoint(),
                            RelayErrorKind::Timeout.as_str()
                        );
                    }
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    // Every worker is gone; the ones still pending panicked.
                    for index in &pending {
                        warn!(
                            "event=relay_unavailable module=relay endpoint={} kind={} reason=worker_panicked",
                            self.relays[*index].endpoint(),
                            RelayErrorKind::Other.as_str()
                        );
                    }
                    break;
                }
            };

            pending.remove(&dispatch.index);
            let endpoint = self.relays[dispatch.index].endpoint();
            match dispatch.result {
                Ok(records) => {
                    let returned = records.len();
                    let mut accepted = 0usize;
                    for record in records {
                        if !filter.matches(&record) {
                            debug!(
                                "event=relay_record_rejected module=relay endpoint={} record_id={} reason=filter_mismatch",
                                endpoint, record.id
                            );
                            continue;
                        }
                        accepted += 1;
                        merged.entry(record.id.clone()).or_insert(record);
                    }
                    debug!(
                        "event=relay_query module=relay status=ok endpoint={} returned={} accepted={} duration_ms={}",
                        endpoint,
                        returned,
                        accepted,
                        dispatch.elapsed.as_millis()
                    );
                }
                Err(err) => warn!(
                    "event=relay_unavailable module=relay endpoint={} kind={} duration_ms={} error={}",
                    endpoint,
                    err.kind.as_str(),
                    dispatch.elapsed.as_millis(),
                    err.message
                ),
            }
        }

        info!(
            "event=relay_fetch module=relay status=ok relays={} unique={} duration_ms={}",
            self.relays.len(),
            merged.len(),
            started_at.elapsed().as_millis()
        );
        merged.into_values().collect()
    }
}
