//! Entity store abstraction and its backends
//!
//! The projector never reaches a process-global database; it is handed an
//! [`EntityStore`] capability. Production uses the RocksDB backend, tests the
//! in-memory one.

pub mod memory;
pub mod rocksdb;

pub use memory::MemoryStore;
pub use rocksdb::{ColumnFamilies, RocksDbStore};

use alloy::primitives::{Address, U256};

use crate::error::IndexerResult;
use crate::events::{EventEnvelope, EventId, EventPosition};
use crate::models::{Creation, PraiseCount};

/// Writes produced by applying a single event.
///
/// A store must commit the whole set atomically: the checkpoint may never
/// become durable ahead of the raw log entry or aggregate updates it belongs
/// to, otherwise a crash between writes would lose events on restart.
#[derive(Debug, Clone, Default)]
pub struct WriteSet {
    pub raw_event: Option<EventEnvelope>,
    pub creation: Option<Creation>,
    pub praise_count: Option<PraiseCount>,
    pub checkpoint: Option<EventPosition>,
}

impl WriteSet {
    pub fn is_empty(&self) -> bool {
        self.raw_event.is_none()
            && self.creation.is_none()
            && self.praise_count.is_none()
            && self.checkpoint.is_none()
    }
}

/// Persistence capability handed to the projector.
pub trait EntityStore: Send + Sync {
    fn get_creation(&self, creation_id: &U256) -> IndexerResult<Option<Creation>>;

    fn get_praise_count(
        &self,
        creation_id: &U256,
        user: &Address,
    ) -> IndexerResult<Option<PraiseCount>>;

    fn get_raw_event(&self, id: &EventId) -> IndexerResult<Option<EventEnvelope>>;

    fn raw_event_exists(&self, id: &EventId) -> IndexerResult<bool> {
        Ok(self.get_raw_event(id)?.is_some())
    }

    /// Last durably applied event position, if any events were applied.
    fn checkpoint(&self) -> IndexerResult<Option<EventPosition>>;

    /// Atomically commit all writes for one event.
    fn commit(&self, writes: &WriteSet) -> IndexerResult<()>;
}
