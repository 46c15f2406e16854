//! In-memory entity store for tests and dry runs

use alloy::primitives::{Address, U256};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::database::{EntityStore, WriteSet};
use crate::error::IndexerResult;
use crate::events::{EventEnvelope, EventId, EventPosition};
use crate::models::{Creation, PraiseCount};

/// HashMap-backed store with the same commit semantics as the RocksDB backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    raw_events: HashMap<EventId, EventEnvelope>,
    creations: HashMap<U256, Creation>,
    praise_counts: HashMap<String, PraiseCount>,
    checkpoint: Option<EventPosition>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of raw log entries written so far.
    pub fn raw_event_count(&self) -> usize {
        self.inner.lock().unwrap().raw_events.len()
    }
}

impl EntityStore for MemoryStore {
    fn get_creation(&self, creation_id: &U256) -> IndexerResult<Option<Creation>> {
        Ok(self.inner.lock().unwrap().creations.get(creation_id).cloned())
    }

    fn get_praise_count(
        &self,
        creation_id: &U256,
        user: &Address,
    ) -> IndexerResult<Option<PraiseCount>> {
        let key = PraiseCount::key(creation_id, user);
        Ok(self.inner.lock().unwrap().praise_counts.get(&key).cloned())
    }

    fn get_raw_event(&self, id: &EventId) -> IndexerResult<Option<EventEnvelope>> {
        Ok(self.inner.lock().unwrap().raw_events.get(id).cloned())
    }

    fn checkpoint(&self) -> IndexerResult<Option<EventPosition>> {
        Ok(self.inner.lock().unwrap().checkpoint)
    }

    fn commit(&self, writes: &WriteSet) -> IndexerResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(event) = &writes.raw_event {
            inner.raw_events.insert(event.event_id(), event.clone());
        }
        if let Some(creation) = &writes.creation {
            inner.creations.insert(creation.creation_id, creation.clone());
        }
        if let Some(praise) = &writes.praise_count {
            let key = PraiseCount::key(&praise.creation_id, &praise.user);
            inner.praise_counts.insert(key, praise.clone());
        }
        if let Some(checkpoint) = writes.checkpoint {
            inner.checkpoint = Some(checkpoint);
        }
        Ok(())
    }
}
