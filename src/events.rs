//! Decoded Abraham contract events and their on-chain envelope

use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Decoded payload of a single Abraham contract log.
///
/// One variant per event the contracts emit. Only `CreationAdded`, `Praised`,
/// `Unpraised` and `ConvictionUpdated` drive aggregate updates; the remaining
/// kinds are recorded as raw log entries only.
// Externally tagged on purpose: values are stored through bincode, which
// cannot handle the internally-tagged representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPayload {
    Approval {
        owner: Address,
        spender: Address,
        value: U256,
    },
    BoughtManna {
        buyer: Address,
        amount: U256,
    },
    ConvictionUpdated {
        creation_id: U256,
        new_conviction: U256,
    },
    CreationAdded {
        creation_id: U256,
        metadata_uri: String,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    PraiseListed {
        listing_id: U256,
        creation_id: U256,
        seller: Address,
        amount: U256,
        price_per_praise: U256,
    },
    PraiseSold {
        listing_id: U256,
        creation_id: U256,
        buyer: Address,
        amount: U256,
        total_cost: U256,
    },
    Praised {
        creation_id: U256,
        user: Address,
        price_paid: U256,
        units_praised: U256,
    },
    SoldManna {
        seller: Address,
        manna_amount: U256,
        eth_amount: U256,
    },
    Transfer {
        from: Address,
        to: Address,
        value: U256,
    },
    Unpraised {
        creation_id: U256,
        user: Address,
        units_unpraised: U256,
        manna_refunded: U256,
        unpraise_cost: U256,
    },
}

impl EventPayload {
    /// Contract-level event name, used for logging and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::Approval { .. } => "Approval",
            EventPayload::BoughtManna { .. } => "BoughtManna",
            EventPayload::ConvictionUpdated { .. } => "ConvictionUpdated",
            EventPayload::CreationAdded { .. } => "CreationAdded",
            EventPayload::OwnershipTransferred { .. } => "OwnershipTransferred",
            EventPayload::PraiseListed { .. } => "PraiseListed",
            EventPayload::PraiseSold { .. } => "PraiseSold",
            EventPayload::Praised { .. } => "Praised",
            EventPayload::SoldManna { .. } => "SoldManna",
            EventPayload::Transfer { .. } => "Transfer",
            EventPayload::Unpraised { .. } => "Unpraised",
        }
    }
}

/// Unique identity of an on-chain log: transaction hash concatenated with the
/// big-endian log index. Unique even for multiple same-kind events emitted in
/// one transaction.
pub type EventId = [u8; 40];

/// Position of a log in the chain's global event order.
///
/// The derived `Ord` compares block number first, then log index, which is
/// exactly the on-chain emission order the projector must follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventPosition {
    pub block_number: u64,
    pub log_index: u64,
}

/// A decoded event together with the raw log metadata it was emitted with.
///
/// This is also the shape of the append-only `RawEvent` entity: the envelope
/// is written once per applied event and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub payload: EventPayload,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub transaction_hash: B256,
    pub log_index: u64,
}

impl EventEnvelope {
    pub fn event_id(&self) -> EventId {
        let mut id = [0u8; 40];
        id[..32].copy_from_slice(self.transaction_hash.as_slice());
        id[32..].copy_from_slice(&self.log_index.to_be_bytes());
        id
    }

    pub fn position(&self) -> EventPosition {
        EventPosition {
            block_number: self.block_number,
            log_index: self.log_index,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}
