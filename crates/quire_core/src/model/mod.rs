//! Domain model for replicated records and their derived views.
//!
//! # Responsibility
//! - Define the immutable record shape shared by relays and the store.
//! - Define article/highlight projections and composite addresses.
//!
//! # Invariants
//! - Records are identified by content hash and never mutated.
//! - Articles are named by `Address`, not by record id, so later versions
//!   supersede earlier ones.

pub mod address;
pub mod article;
pub mod entity;
pub mod filter;
pub mod record;
