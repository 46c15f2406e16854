//! RocksDB storage layer with serde support

use alloy::primitives::{Address, U256};
use rocksdb::{ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options, WriteBatch};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::config::RocksDbConfig;
use crate::database::{EntityStore, WriteSet};
use crate::error::{IndexerError, IndexerResult, StorageError};
use crate::events::{EventEnvelope, EventId, EventPosition};
use crate::models::{Creation, PraiseCount};

/// Type alias for the RocksDB instance
pub type RocksDb = DBWithThreadMode<MultiThreaded>;

/// Column family names for different entity types
pub struct ColumnFamilies;

impl ColumnFamilies {
    pub const RAW_EVENTS: &'static str = "raw_events";
    pub const CREATIONS: &'static str = "creations";
    pub const PRAISE_COUNTS: &'static str = "praise_counts";
    pub const METADATA: &'static str = "metadata";

    /// Get all column family names
    pub fn all() -> Vec<&'static str> {
        vec![
            Self::RAW_EVENTS,
            Self::CREATIONS,
            Self::PRAISE_COUNTS,
            Self::METADATA,
        ]
    }
}

const CHECKPOINT_KEY: &[u8] = b"checkpoint";

/// RocksDB-backed entity store
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<RocksDb>,
}

impl RocksDbStore {
    /// Open (or create) the database at the configured path.
    pub fn open(config: &RocksDbConfig) -> IndexerResult<Self> {
        info!("Initializing RocksDB at path: {}", config.path.display());

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Performance tuning
        db_opts.set_max_open_files(config.max_open_files);
        db_opts.set_write_buffer_size(config.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.max_write_buffer_number);

        if config.enable_compression {
            db_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        }

        let cache = rocksdb::Cache::new_lru_cache(config.block_cache_size_mb * 1024 * 1024);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_block_cache(&cache);
        db_opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ColumnFamilies::all()
            .into_iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
                ColumnFamilyDescriptor::new(name, cf_opts)
            })
            .collect();

        let db = RocksDb::open_cf_descriptors(&db_opts, &config.path, cf_descriptors)?;

        info!("RocksDB initialized successfully");

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle
    fn get_cf(&self, name: &str) -> IndexerResult<Arc<rocksdb::BoundColumnFamily<'_>>> {
        self.db.cf_handle(name).ok_or_else(|| {
            IndexerError::Storage(StorageError::MissingColumnFamily(name.to_string()))
        })
    }

    /// Get and deserialize a value from a column family
    fn get<T: for<'de> Deserialize<'de>>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> IndexerResult<Option<T>> {
        let cf = self.get_cf(cf_name)?;
        match self.db.get_cf(&cf, key)? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    /// Serialize a value into a write batch
    fn batch_put<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        cf_name: &str,
        key: &[u8],
        value: &T,
    ) -> IndexerResult<()> {
        let cf = self.get_cf(cf_name)?;
        batch.put_cf(&cf, key, bincode::serialize(value)?);
        Ok(())
    }

    /// Flush all column families
    pub fn flush(&self) -> IndexerResult<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Approximate per-column-family key counts, for shutdown logging.
    pub fn entity_counts(&self) -> IndexerResult<Vec<(&'static str, u64)>> {
        let mut counts = Vec::new();
        for cf_name in ColumnFamilies::all() {
            let cf = self.get_cf(cf_name)?;
            let count = self
                .db
                .property_int_value_cf(&cf, "rocksdb.estimate-num-keys")?
                .unwrap_or(0);
            counts.push((cf_name, count));
        }
        Ok(counts)
    }
}

impl EntityStore for RocksDbStore {
    fn get_creation(&self, creation_id: &U256) -> IndexerResult<Option<Creation>> {
        self.get(ColumnFamilies::CREATIONS, &Creation::key(creation_id))
    }

    fn get_praise_count(
        &self,
        creation_id: &U256,
        user: &Address,
    ) -> IndexerResult<Option<PraiseCount>> {
        let key = PraiseCount::key(creation_id, user);
        self.get(ColumnFamilies::PRAISE_COUNTS, key.as_bytes())
    }

    fn get_raw_event(&self, id: &EventId) -> IndexerResult<Option<EventEnvelope>> {
        self.get(ColumnFamilies::RAW_EVENTS, id)
    }

    fn raw_event_exists(&self, id: &EventId) -> IndexerResult<bool> {
        let cf = self.get_cf(ColumnFamilies::RAW_EVENTS)?;
        Ok(self.db.get_cf(&cf, id)?.is_some())
    }

    fn checkpoint(&self) -> IndexerResult<Option<EventPosition>> {
        self.get(ColumnFamilies::METADATA, CHECKPOINT_KEY)
    }

    fn commit(&self, writes: &WriteSet) -> IndexerResult<()> {
        if writes.is_empty() {
            return Ok(());
        }

        let mut batch = WriteBatch::default();

        if let Some(event) = &writes.raw_event {
            self.batch_put(
                &mut batch,
                ColumnFamilies::RAW_EVENTS,
                &event.event_id(),
                event,
            )?;
        }
        if let Some(creation) = &writes.creation {
            self.batch_put(
                &mut batch,
                ColumnFamilies::CREATIONS,
                &Creation::key(&creation.creation_id),
                creation,
            )?;
        }
        if let Some(praise) = &writes.praise_count {
            let key = PraiseCount::key(&praise.creation_id, &praise.user);
            self.batch_put(
                &mut batch,
                ColumnFamilies::PRAISE_COUNTS,
                key.as_bytes(),
                praise,
            )?;
        }
        if let Some(checkpoint) = &writes.checkpoint {
            self.batch_put(&mut batch, ColumnFamilies::METADATA, CHECKPOINT_KEY, checkpoint)?;
        }

        self.db.write(batch)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventPayload;
    use alloy::primitives::B256;
    use tempfile::TempDir;

    fn create_test_config() -> (RocksDbConfig, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = RocksDbConfig {
            path: temp_dir.path().to_path_buf(),
            enable_compression: true,
            max_open_files: 100,
            write_buffer_size_mb: 16,
            max_write_buffer_number: 2,
            block_cache_size_mb: 32,
        };
        (config, temp_dir)
    }

    fn sample_envelope() -> EventEnvelope {
        EventEnvelope {
            payload: EventPayload::CreationAdded {
                creation_id: U256::from(1),
                metadata_uri: "ipfs://x".to_string(),
            },
            block_number: 100,
            block_timestamp: 1_700_000_000,
            transaction_hash: B256::repeat_byte(0x42),
            log_index: 0,
        }
    }

    #[test]
    fn test_store_creation() {
        let (config, _temp_dir) = create_test_config();
        let store = RocksDbStore::open(&config).unwrap();

        for cf_name in ColumnFamilies::all() {
            assert!(store.get_cf(cf_name).is_ok());
        }
    }

    #[test]
    fn test_commit_and_read_back() {
        let (config, _temp_dir) = create_test_config();
        let store = RocksDbStore::open(&config).unwrap();

        let event = sample_envelope();
        let creation = Creation::new(U256::from(1), "ipfs://x".to_string(), 1_700_000_000);
        let writes = WriteSet {
            raw_event: Some(event.clone()),
            creation: Some(creation.clone()),
            praise_count: None,
            checkpoint: Some(event.position()),
        };
        store.commit(&writes).unwrap();

        assert!(store.raw_event_exists(&event.event_id()).unwrap());
        assert_eq!(store.get_raw_event(&event.event_id()).unwrap(), Some(event.clone()));
        assert_eq!(store.get_creation(&U256::from(1)).unwrap(), Some(creation));
        assert_eq!(store.checkpoint().unwrap(), Some(event.position()));
        assert_eq!(store.get_creation(&U256::from(2)).unwrap(), None);
    }

    #[test]
    fn test_checkpoint_survives_reopen() {
        let (config, _temp_dir) = create_test_config();

        let event = sample_envelope();
        {
            let store = RocksDbStore::open(&config).unwrap();
            let writes = WriteSet {
                raw_event: Some(event.clone()),
                checkpoint: Some(event.position()),
                ..Default::default()
            };
            store.commit(&writes).unwrap();
            store.flush().unwrap();
        }

        let store = RocksDbStore::open(&config).unwrap();
        assert_eq!(store.checkpoint().unwrap(), Some(event.position()));
        assert!(store.raw_event_exists(&event.event_id()).unwrap());
    }

    #[test]
    fn test_praise_count_round_trip() {
        let (config, _temp_dir) = create_test_config();
        let store = RocksDbStore::open(&config).unwrap();

        let user = Address::repeat_byte(0x11);
        let praise = PraiseCount::new(U256::from(3), user, U256::from(2), U256::from(500));
        let writes = WriteSet {
            praise_count: Some(praise.clone()),
            ..Default::default()
        };
        store.commit(&writes).unwrap();

        assert_eq!(
            store.get_praise_count(&U256::from(3), &user).unwrap(),
            Some(praise)
        );
        assert_eq!(
            store
                .get_praise_count(&U256::from(3), &Address::repeat_byte(0x22))
                .unwrap(),
            None
        );
    }
}
