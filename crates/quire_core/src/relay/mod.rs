//! Relay access: client contract, registry and concurrent fan-out.
//!
//! # Responsibility
//! - Define what core needs from one relay connection.
//! - Merge many untrusted relays into one deduplicated answer.
//!
//! # Invariants
//! - Relay failures are contained here and only logged.
//! - No retries; the next sync is the retry.

pub mod aggregator;
pub mod client;
pub mod registry;
