//! Materialized entities.
//!
//! Every entity is a plain serde document keyed by a stable string id. The
//! store adapter never interprets them; it only needs `Entity::KIND` to keep
//! one id namespace per entity type.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::codes::{ClaimStatus, Period, Phase, PerRuling, RulingOption, RULING_SLOTS};

/// Token amounts (bounties, fees, contributions, scores).
pub type Amount = u128;

/// Hex-encoded account or contract address.
pub type Address = String;

pub type DisputeId = u64;

pub trait Entity: Serialize + DeserializeOwned {
    const KIND: &'static str;

    fn id(&self) -> &str;
}

macro_rules! entity {
    ($ty:ty, $kind:literal) => {
        impl Entity for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

pub fn claim_entity_id(slot: u64, created_at_block: u64) -> String {
    format!("{slot}-{created_at_block}")
}

pub fn round_id(dispute: DisputeId, index: u32) -> String {
    format!("{dispute}-{index}")
}

pub fn contribution_id(dispute: DisputeId, round: u32, contributor: &str, ruling: u64) -> String {
    format!("{dispute}-{round}-{contributor}-{ruling}")
}

pub fn reward_id(dispute: DisputeId, contributor: &str) -> String {
    format!("{dispute}-{contributor}")
}

pub fn event_id(tx_hash: &str, log_index: u64) -> String {
    format!("{tx_hash}-{log_index}")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: String,
    pub external_claim_id: String,
    pub owner: Address,
    pub category: u64,
    pub status: ClaimStatus,
    pub bounty: Amount,
    pub withdrawal_permitted_at: u64,
    pub last_balance_update_block: u64,
    pub last_calculated_score: Amount,
    pub created_at_block: u64,
    pub created_at_timestamp: u64,
    pub arbitrator_ref: Address,
    pub arbitrator_extra_data: String,
    pub challenger: Option<Address>,
}
entity!(Claim, "Claim");

/// Maps a claim storage slot to the logical claim currently living in it.
///
/// A slot can be reused by a later claim; the entity id then moves to the new
/// `{slot}-{creationBlock}` claim while the old one stays untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStorage {
    pub id: String,
    pub claim_entity_id: String,
}
entity!(ClaimStorage, "ClaimStorage");

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitratorState {
    pub id: Address,
    pub phase: Phase,
    pub last_phase_change: u64,
    pub min_staking_time: u64,
    pub next_delayed_set_stake: u64,
    pub last_delayed_set_stake: u64,
}
entity!(ArbitratorState, "ArbitratorState");

impl ArbitratorState {
    pub fn new(id: impl Into<Address>) -> Self {
        Self {
            id: id.into(),
            phase: Phase::Staking,
            last_phase_change: 0,
            min_staking_time: 0,
            next_delayed_set_stake: 0,
            last_delayed_set_stake: 0,
        }
    }
}

/// Number of arbitrator periods a court configures a duration for.
pub const COURT_PERIODS: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Court {
    pub id: String,
    #[serde(rename = "policyURI")]
    pub policy_uri: Option<String>,
    pub hidden_votes: bool,
    pub times_per_period: [u64; COURT_PERIODS],
}
entity!(Court, "Court");

impl Court {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            policy_uri: None,
            hidden_votes: false,
            times_per_period: [0; COURT_PERIODS],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispute {
    pub id: String,
    pub claim_ref: String,
    pub court_ref: String,
    /// Arbitrable contract that created the dispute.
    pub arbitrable: Address,
    pub period: Period,
    pub last_period_change: u64,
    pub ruling: u64,
    pub ruled: bool,
    /// Distinct contributors in first-contribution order.
    pub contributors: Vec<Address>,
    /// Number of rounds opened so far; rounds are `0..round_count`.
    pub round_count: u32,
}
entity!(Dispute, "Dispute");

impl Dispute {
    pub fn last_round_index(&self) -> Option<u32> {
        self.round_count.checked_sub(1)
    }

    /// Record a contributor once. Returns false when already present.
    pub fn add_contributor(&mut self, contributor: &str) -> bool {
        if self.contributors.iter().any(|c| c == contributor) {
            return false;
        }
        self.contributors.push(contributor.to_string());
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: String,
    pub dispute_ref: String,
    pub index: u32,
    pub jury_size: u64,
    pub votes_per_choice: PerRuling<u64>,
    pub appeal_deadline: PerRuling<u64>,
    pub raised_so_far: PerRuling<Amount>,
    pub total_to_be_raised: PerRuling<Amount>,
    pub has_paid: PerRuling<bool>,
}
entity!(Round, "Round");

impl Round {
    pub fn new(dispute: DisputeId, index: u32, jury_size: u64) -> Self {
        Self {
            id: round_id(dispute, index),
            dispute_ref: dispute.to_string(),
            index,
            jury_size,
            votes_per_choice: [0; RULING_SLOTS],
            appeal_deadline: [0; RULING_SLOTS],
            raised_so_far: [0; RULING_SLOTS],
            total_to_be_raised: [0; RULING_SLOTS],
            has_paid: [false; RULING_SLOTS],
        }
    }

    pub fn mark_paid(&mut self, ruling: RulingOption) {
        self.has_paid[ruling.index()] = true;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub id: String,
    pub amount: Amount,
    pub contributor: Address,
    pub withdrew: bool,
}
entity!(Contribution, "Contribution");

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: String,
    pub total_withdrawable_amount: Amount,
    pub withdrew: bool,
    pub beneficiary: Address,
}
entity!(Reward, "Reward");

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Address,
}
entity!(User, "User");

/// The single arbitrable (claim) contract a store materializes, under id `0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arbitrable {
    pub id: String,
    pub address: Address,
    pub network: String,
}
entity!(Arbitrable, "Arbitrable");

/// Id of the one `Arbitrable` record.
pub const ARBITRABLE_ID: &str = "0";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaEvidence {
    pub id: String,
    pub uri: String,
}
entity!(MetaEvidence, "MetaEvidence");

/// Append-only audit record, one per emitting handler invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLog {
    pub id: String,
    pub name: String,
    pub related_claim: String,
    pub details: Option<String>,
    pub from: Option<Address>,
    pub timestamp: u64,
}
entity!(EventLog, "EventLog");

/// Marker written together with an event's own effects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedEvent {
    pub id: String,
    pub block: u64,
}
entity!(ProcessedEvent, "ProcessedEvent");
