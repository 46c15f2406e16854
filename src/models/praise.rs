//! Per-user praise bookkeeping

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Mutable aggregate tracking one user's praise position on one creation.
///
/// Both counters are clamped at zero when unpraise deltas exceed the tracked
/// balance; the event stream is not trusted to never over-withdraw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PraiseCount {
    pub creation_id: U256,
    pub user: Address,
    pub no_of_praises: U256,
    pub manna_staked: U256,
}

impl PraiseCount {
    /// Initial position as materialized by a user's first `Praised` event.
    pub fn new(creation_id: U256, user: Address, units: U256, manna: U256) -> Self {
        Self {
            creation_id,
            user,
            no_of_praises: units,
            manna_staked: manna,
        }
    }

    /// Storage key for a `(creation, user)` pair: `{creationId}-{user}`.
    pub fn key(creation_id: &U256, user: &Address) -> String {
        format!("{creation_id}-{user}")
    }
}
