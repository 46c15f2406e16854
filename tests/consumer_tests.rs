//! Apply-loop tests: resume, replay, and metrics accounting

use alloy::primitives::{Address, B256, U256};
use anyhow::Result;
use std::sync::Arc;

use abraham_indexer::consumer::EventConsumer;
use abraham_indexer::database::{EntityStore, MemoryStore};
use abraham_indexer::events::{EventEnvelope, EventPayload};
use abraham_indexer::feed::VecFeed;
use abraham_indexer::metrics::Metrics;
use abraham_indexer::models::INIT_PRAISE_PRICE;
use abraham_indexer::projector::MissingAggregatePolicy;

fn envelope(payload: EventPayload, block: u64, log_index: u64) -> EventEnvelope {
    EventEnvelope {
        payload,
        block_number: block,
        block_timestamp: 1_700_000_000 + block,
        transaction_hash: B256::repeat_byte(block as u8),
        log_index,
    }
}

fn sample_events() -> Vec<EventEnvelope> {
    let user = Address::repeat_byte(0xaa);
    vec![
        envelope(
            EventPayload::CreationAdded {
                creation_id: U256::from(1),
                metadata_uri: "ipfs://x".to_string(),
            },
            100,
            0,
        ),
        envelope(
            EventPayload::Praised {
                creation_id: U256::from(1),
                user,
                price_paid: INIT_PRAISE_PRICE,
                units_praised: U256::from(1),
            },
            101,
            0,
        ),
        envelope(
            EventPayload::ConvictionUpdated {
                creation_id: U256::from(1),
                new_conviction: U256::from(5),
            },
            102,
            0,
        ),
    ]
}

fn consumer(
    store: Arc<MemoryStore>,
    events: Vec<EventEnvelope>,
    metrics: Arc<Metrics>,
) -> EventConsumer<MemoryStore, VecFeed> {
    EventConsumer::new(
        store,
        VecFeed::new(events),
        MissingAggregatePolicy::Skip,
        metrics,
        1000,
    )
}

#[tokio::test]
async fn test_drains_feed_and_advances_checkpoint() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let metrics = Arc::new(Metrics::new()?);
    let events = sample_events();
    let last_position = events.last().unwrap().position();

    let processed = consumer(store.clone(), events, metrics.clone()).run().await?;

    assert_eq!(processed, 3);
    assert_eq!(store.raw_event_count(), 3);
    assert_eq!(store.checkpoint()?, Some(last_position));

    let creation = store.get_creation(&U256::from(1))?.unwrap();
    assert_eq!(creation.total_staked, U256::from(1));
    assert_eq!(creation.conviction, U256::from(5));
    Ok(())
}

#[tokio::test]
async fn test_restart_skips_processed_events() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let metrics = Arc::new(Metrics::new()?);
    let events = sample_events();

    consumer(store.clone(), events.clone(), metrics.clone())
        .run()
        .await?;

    // Second run over the full feed, as a restart with at-least-once delivery
    // would see it. Everything is at or below the checkpoint.
    let processed = consumer(store.clone(), events, metrics.clone()).run().await?;
    assert_eq!(processed, 0);

    let creation = store.get_creation(&U256::from(1))?.unwrap();
    assert_eq!(creation.total_staked, U256::from(1));
    assert_eq!(creation.praise_pool, INIT_PRAISE_PRICE);
    Ok(())
}

#[tokio::test]
async fn test_partial_overlap_applies_only_new_events() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let metrics = Arc::new(Metrics::new()?);
    let events = sample_events();

    // First run sees only the first two events.
    consumer(store.clone(), events[..2].to_vec(), metrics.clone())
        .run()
        .await?;
    assert_eq!(store.checkpoint()?, Some(events[1].position()));

    // Restarted feed replays everything plus the tail.
    let processed = consumer(store.clone(), events.clone(), metrics.clone())
        .run()
        .await?;
    assert_eq!(processed, 1);

    let creation = store.get_creation(&U256::from(1))?.unwrap();
    assert_eq!(creation.total_staked, U256::from(1));
    assert_eq!(creation.conviction, U256::from(5));
    assert_eq!(store.checkpoint()?, Some(events[2].position()));
    Ok(())
}

#[tokio::test]
async fn test_out_of_order_duplicate_is_counted_not_applied() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let metrics = Arc::new(Metrics::new()?);
    let mut events = sample_events();
    // The Praised event shows up a second time, late.
    events.push(events[1].clone());

    let processed = consumer(store.clone(), events, metrics.clone()).run().await?;
    assert_eq!(processed, 4);

    let creation = store.get_creation(&U256::from(1))?.unwrap();
    assert_eq!(creation.total_staked, U256::from(1));
    assert_eq!(metrics.duplicate_events.get(), 1);
    assert_eq!(metrics.out_of_order_events.get(), 1);
    Ok(())
}

#[tokio::test]
async fn test_missing_aggregate_is_counted() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let metrics = Arc::new(Metrics::new()?);
    let events = vec![envelope(
        EventPayload::ConvictionUpdated {
            creation_id: U256::from(42),
            new_conviction: U256::from(1),
        },
        100,
        0,
    )];

    consumer(store.clone(), events, metrics.clone()).run().await?;

    assert_eq!(metrics.missing_aggregates.get(), 1);
    assert_eq!(store.raw_event_count(), 1);
    assert_eq!(store.get_creation(&U256::from(42))?, None);
    Ok(())
}
