//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate relay fan-out, store writes and overlay into use-cases.
//! - Keep CLI and other callers decoupled from storage and relay details.

pub mod assembler;
pub mod ingest_service;
