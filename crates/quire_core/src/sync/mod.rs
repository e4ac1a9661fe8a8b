//! Incremental sync state.
//!
//! # Responsibility
//! - Track, per author, how far back records are already stored.

pub mod watermark;
