//! Record store contract and its SQLite implementation.
//!
//! # Responsibility
//! - Define the save/query contract the ingest pipeline depends on.
//! - Isolate SQL details from relay and overlay logic.
//!
//! # Invariants
//! - Saves are idempotent by record id.
//! - Store errors are values; nothing in this layer panics on bad rows.

pub mod record_repo;
