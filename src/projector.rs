//! Event projector: applies decoded chain events to the entity store
//!
//! One event at a time, in emission order. Every applied event appends a raw
//! log entry; `CreationAdded`, `Praised`, `Unpraised` and `ConvictionUpdated`
//! additionally update the Creation/PraiseCount aggregates. All writes for an
//! event, including the resume checkpoint, land in a single atomic commit.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::database::{EntityStore, WriteSet};
use crate::error::{IndexerError, IndexerResult};
use crate::events::{EventEnvelope, EventPayload};
use crate::models::{praise_price, Creation, PraiseCount};

/// What to do when an event references an aggregate that is not in the store.
///
/// This happens when the observed event range starts after the aggregate's
/// creating event, or when the stream is delivered out of order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingAggregatePolicy {
    /// Drop the aggregate update, still append the raw log entry.
    #[default]
    Skip,
    /// Fail the apply step; nothing is committed.
    Strict,
}

/// Per-event apply report, consumed by the caller for metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Raw log entry already existed; aggregates were left untouched.
    pub duplicate: bool,
    /// Number of aggregate updates dropped because the target was absent.
    pub missing_aggregates: u32,
    /// An unpraise delta exceeded the tracked balance and was clamped to zero.
    pub clamped: bool,
}

/// Applies events to an injected entity store, strictly sequentially.
pub struct Projector<S: EntityStore> {
    store: Arc<S>,
    policy: MissingAggregatePolicy,
}

impl<S: EntityStore> Projector<S> {
    pub fn new(store: Arc<S>, policy: MissingAggregatePolicy) -> Self {
        Self { store, policy }
    }

    /// Apply one event and atomically commit its writes.
    ///
    /// Idempotent under replay: if the event's raw log entry already exists,
    /// only the checkpoint may advance. Replaying a committed `Praised` or
    /// `Unpraised` therefore never double-applies its deltas.
    pub fn apply(&self, event: &EventEnvelope) -> IndexerResult<ApplyOutcome> {
        let mut outcome = ApplyOutcome::default();
        let position = event.position();

        // Checkpoint only moves forward; a late duplicate must not rewind it.
        let checkpoint = self.store.checkpoint()?;
        let advance = checkpoint.map_or(true, |cp| position > cp);

        if self.store.raw_event_exists(&event.event_id())? {
            debug!(
                kind = event.kind(),
                block = event.block_number,
                log_index = event.log_index,
                "skipping already-applied event"
            );
            outcome.duplicate = true;
            if advance {
                self.store.commit(&WriteSet {
                    checkpoint: Some(position),
                    ..Default::default()
                })?;
            }
            return Ok(outcome);
        }

        let mut writes = WriteSet {
            raw_event: Some(event.clone()),
            checkpoint: advance.then_some(position),
            ..Default::default()
        };

        match &event.payload {
            EventPayload::CreationAdded {
                creation_id,
                metadata_uri,
            } => {
                // Idempotent: a duplicate CreationAdded never resets state.
                if self.store.get_creation(creation_id)?.is_none() {
                    writes.creation = Some(Creation::new(
                        *creation_id,
                        metadata_uri.clone(),
                        event.block_timestamp,
                    ));
                }
            }

            EventPayload::Praised {
                creation_id,
                user,
                price_paid,
                units_praised,
            } => {
                match self.store.get_creation(creation_id)? {
                    Some(mut creation) => {
                        creation.total_staked += *units_praised;
                        creation.praise_pool += *price_paid;
                        creation.current_price_to_praise = praise_price(creation.total_staked);
                        creation.updated_at = event.block_timestamp;
                        writes.creation = Some(creation);
                    }
                    None => self.on_missing("Creation", creation_id.to_string(), event, &mut outcome)?,
                }

                let praise = match self.store.get_praise_count(creation_id, user)? {
                    Some(mut praise) => {
                        praise.no_of_praises += *units_praised;
                        praise.manna_staked += *price_paid;
                        praise
                    }
                    None => PraiseCount::new(*creation_id, *user, *units_praised, *price_paid),
                };
                writes.praise_count = Some(praise);
            }

            EventPayload::Unpraised {
                creation_id,
                user,
                units_unpraised,
                manna_refunded,
                ..
            } => {
                match self.store.get_creation(creation_id)? {
                    Some(mut creation) => {
                        if *units_unpraised > creation.total_staked
                            || *manna_refunded > creation.praise_pool
                        {
                            outcome.clamped = true;
                        }
                        creation.total_staked = creation.total_staked.saturating_sub(*units_unpraised);
                        creation.praise_pool = creation.praise_pool.saturating_sub(*manna_refunded);
                        creation.current_price_to_praise = praise_price(creation.total_staked);
                        creation.updated_at = event.block_timestamp;
                        writes.creation = Some(creation);
                    }
                    None => self.on_missing("Creation", creation_id.to_string(), event, &mut outcome)?,
                }

                match self.store.get_praise_count(creation_id, user)? {
                    Some(mut praise) => {
                        if *units_unpraised > praise.no_of_praises
                            || *manna_refunded > praise.manna_staked
                        {
                            outcome.clamped = true;
                        }
                        praise.no_of_praises = praise.no_of_praises.saturating_sub(*units_unpraised);
                        praise.manna_staked = praise.manna_staked.saturating_sub(*manna_refunded);
                        writes.praise_count = Some(praise);
                    }
                    None => self.on_missing(
                        "PraiseCount",
                        PraiseCount::key(creation_id, user),
                        event,
                        &mut outcome,
                    )?,
                }
            }

            EventPayload::ConvictionUpdated {
                creation_id,
                new_conviction,
            } => match self.store.get_creation(creation_id)? {
                Some(mut creation) => {
                    creation.conviction = *new_conviction;
                    creation.updated_at = event.block_timestamp;
                    writes.creation = Some(creation);
                }
                None => self.on_missing("Creation", creation_id.to_string(), event, &mut outcome)?,
            },

            // Informational kinds: raw log entry only.
            EventPayload::Approval { .. }
            | EventPayload::BoughtManna { .. }
            | EventPayload::OwnershipTransferred { .. }
            | EventPayload::PraiseListed { .. }
            | EventPayload::PraiseSold { .. }
            | EventPayload::SoldManna { .. }
            | EventPayload::Transfer { .. } => {}
        }

        self.store.commit(&writes)?;
        Ok(outcome)
    }

    fn on_missing(
        &self,
        entity: &'static str,
        id: String,
        event: &EventEnvelope,
        outcome: &mut ApplyOutcome,
    ) -> IndexerResult<()> {
        match self.policy {
            MissingAggregatePolicy::Skip => {
                warn!(
                    entity,
                    id = %id,
                    kind = event.kind(),
                    block = event.block_number,
                    log_index = event.log_index,
                    "aggregate missing, dropping update"
                );
                outcome.missing_aggregates += 1;
                Ok(())
            }
            MissingAggregatePolicy::Strict => Err(IndexerError::MissingAggregate {
                entity,
                id,
                event: event.kind(),
            }),
        }
    }
}
