//! Highlight overlay over article text.
//!
//! # Responsibility
//! - Wrap highlight excerpts found in a body with a visual marker.
//!
//! # Invariants
//! - Text already inside a marker is never matched again.
//! - Empty excerpts never match.

pub mod merge;
