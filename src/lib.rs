//! Abraham Event Indexer Library
//!
//! Chain-event projector for the Abraham contracts (Manna token and the
//! creation/praise marketplace): consumes an ordered stream of decoded events
//! and mirrors it into RocksDB as an append-only raw log plus Creation and
//! PraiseCount aggregates.

pub mod config;
pub mod consumer;
pub mod database;
pub mod error;
pub mod events;
pub mod feed;
pub mod metrics;
pub mod models;
pub mod projector;

// Re-export commonly used types
pub use config::IndexerConfig;
pub use consumer::EventConsumer;
pub use database::{EntityStore, MemoryStore, RocksDbStore, WriteSet};
pub use error::{IndexerError, IndexerResult};
pub use events::{EventEnvelope, EventPayload, EventPosition};
pub use models::{Creation, PraiseCount, INIT_PRAISE_PRICE};
pub use projector::{ApplyOutcome, MissingAggregatePolicy, Projector};
