//! Creation aggregate and the praise bonding curve

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// Base praise price: one whole Manna at 18-decimal fixed point.
pub const INIT_PRAISE_PRICE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Price to praise a creation with `total_staked` units already staked.
///
/// Linear bonding curve: the price grows by one `INIT_PRAISE_PRICE` increment
/// per unit of existing stake, i.e. `INIT_PRAISE_PRICE * (1 + total_staked)`.
pub fn praise_price(total_staked: U256) -> U256 {
    INIT_PRAISE_PRICE + total_staked * INIT_PRAISE_PRICE
}

/// Mutable per-creation aggregate, updated incrementally by praise events.
///
/// `total_staked` tracks active praise units and `praise_pool` the Manna
/// currently staked; both are maintained as running deltas, not recomputed
/// sums. Timestamps are block timestamps from the originating events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creation {
    pub creation_id: U256,
    pub metadata_uri: String,
    pub total_staked: U256,
    pub praise_pool: U256,
    pub conviction: U256,
    pub current_price_to_praise: U256,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Creation {
    /// Fresh aggregate as materialized by a `CreationAdded` event.
    pub fn new(creation_id: U256, metadata_uri: String, timestamp: u64) -> Self {
        Self {
            creation_id,
            metadata_uri,
            total_staked: U256::ZERO,
            praise_pool: U256::ZERO,
            conviction: U256::ZERO,
            current_price_to_praise: INIT_PRAISE_PRICE,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Big-endian storage key for this creation id.
    pub fn key(creation_id: &U256) -> [u8; 32] {
        creation_id.to_be_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_is_linear_in_total_staked() {
        assert_eq!(praise_price(U256::ZERO), INIT_PRAISE_PRICE);
        assert_eq!(praise_price(U256::from(1)), INIT_PRAISE_PRICE * U256::from(2));
        assert_eq!(
            praise_price(U256::from(99)),
            INIT_PRAISE_PRICE * U256::from(100)
        );
    }

    #[test]
    fn new_creation_starts_at_base_price() {
        let creation = Creation::new(U256::from(7), "ipfs://x".to_string(), 1_700_000_000);
        assert_eq!(creation.total_staked, U256::ZERO);
        assert_eq!(creation.praise_pool, U256::ZERO);
        assert_eq!(creation.current_price_to_praise, INIT_PRAISE_PRICE);
        assert_eq!(creation.created_at, creation.updated_at);
    }
}
