//! Core logic for Quire: relay aggregation, incremental sync and
//! highlight overlay over long-form articles.
//! This crate is the single source of truth for sync and overlay invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod overlay;
pub mod relay;
pub mod repo;
pub mod search;
pub mod service;
pub mod sync;

pub use config::{load_config, load_config_from_env, AppConfig, ConfigError, CONFIG_ENV_VAR};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::address::{Address, AddressError};
pub use model::article::{Article, ArticleViewError, Highlight};
pub use model::entity::EntityRef;
pub use model::filter::RecordFilter;
pub use model::record::{
    Kind, Record, RecordId, RecordValidationError, Tag, Timestamp, KIND_ARTICLE, KIND_HIGHLIGHT,
    TIMESTAMP_MIN,
};
pub use overlay::merge::{overlay_excerpts, Overlay, MARK_CLOSE, MARK_OPEN};
pub use relay::aggregator::Aggregator;
pub use relay::client::{RelayClient, RelayError, RelayErrorKind, RelayResult};
pub use relay::registry::{RelayRegistry, RelayRegistryError};
pub use repo::record_repo::{RecordStore, RepoError, RepoResult, SaveOutcome, SqliteRecordStore};
pub use search::fts::{search_records, SearchError, SearchHit, SearchQuery};
pub use service::assembler::assemble;
pub use service::ingest_service::{IngestError, IngestService, SyncOptions};
pub use sync::watermark::{SyncTracker, Watermark};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
