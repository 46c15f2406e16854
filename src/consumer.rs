//! Sequential apply loop driving the projector from an event feed

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::database::EntityStore;
use crate::events::EventPosition;
use crate::feed::EventFeed;
use crate::metrics::Metrics;
use crate::projector::{MissingAggregatePolicy, Projector};

/// Single-writer consumer: pulls events off the feed one at a time and applies
/// them through the projector. There is deliberately no parallelism here;
/// aggregate updates are order-dependent deltas.
pub struct EventConsumer<S: EntityStore, F: EventFeed> {
    store: Arc<S>,
    projector: Projector<S>,
    feed: F,
    metrics: Arc<Metrics>,
    progress_log_interval: u64,
}

impl<S: EntityStore, F: EventFeed> EventConsumer<S, F> {
    pub fn new(
        store: Arc<S>,
        feed: F,
        policy: MissingAggregatePolicy,
        metrics: Arc<Metrics>,
        progress_log_interval: u64,
    ) -> Self {
        Self {
            projector: Projector::new(store.clone(), policy),
            store,
            feed,
            metrics,
            progress_log_interval,
        }
    }

    /// Drain the feed, resuming after the last durably committed event.
    ///
    /// A store failure aborts the loop before the checkpoint advances past the
    /// failed event, so a restart picks up exactly where processing stopped.
    pub async fn run(mut self) -> Result<u64> {
        let resume_from = self.store.checkpoint()?;
        match resume_from {
            Some(cp) => info!(
                block = cp.block_number,
                log_index = cp.log_index,
                "resuming after checkpoint"
            ),
            None => info!("no checkpoint found, starting from the beginning"),
        }

        let mut last_applied: Option<EventPosition> = resume_from;
        let mut processed = 0u64;

        while let Some(event) = self.feed.next_event().await? {
            let position = event.position();

            // Restart path: everything at or below the durable checkpoint has
            // already been applied, skip without touching the store.
            if resume_from.is_some_and(|cp| position <= cp) {
                debug!(
                    block = position.block_number,
                    log_index = position.log_index,
                    "skipping event at or below checkpoint"
                );
                continue;
            }

            if last_applied.is_some_and(|last| position <= last) {
                // Out-of-order delivery; the projector's raw-log existence
                // check keeps a true duplicate from double-applying.
                warn!(
                    kind = event.kind(),
                    block = position.block_number,
                    log_index = position.log_index,
                    "event at or before last applied position"
                );
                self.metrics.out_of_order_events.inc();
            }

            let outcome = self.projector.apply(&event)?;

            if outcome.duplicate {
                self.metrics.duplicate_events.inc();
            } else {
                self.metrics
                    .events_applied
                    .with_label_values(&[event.kind()])
                    .inc();
            }
            if outcome.missing_aggregates > 0 {
                self.metrics
                    .missing_aggregates
                    .inc_by(outcome.missing_aggregates as u64);
            }
            if outcome.clamped {
                self.metrics.clamped_underflows.inc();
            }

            last_applied = Some(last_applied.map_or(position, |last| last.max(position)));
            processed += 1;
            if processed % self.progress_log_interval == 0 {
                info!(
                    processed,
                    block = position.block_number,
                    "projector progress"
                );
            }
        }

        info!(processed, "event feed exhausted");
        Ok(processed)
    }
}
