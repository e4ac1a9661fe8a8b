//! Full-text search over stored records.
//!
//! # Responsibility
//! - Keyword search across record bodies for article lookup.
//! - Keep FTS5 query syntax handling out of the service layer.

pub mod fts;
