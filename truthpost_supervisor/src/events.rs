//! Pre-decoded inbound events, as delivered by the ingestion host.

use serde::{Deserialize, Serialize};
use truthpost_core::{event_id, Address, Amount, DisputeId};

/// Block and transaction metadata common to every event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    /// Contract that emitted the event (or received the call).
    pub address: Address,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub tx_hash: String,
    /// Log index within the block; call handlers get a host-assigned index.
    pub log_index: u64,
    /// Transaction sender.
    pub from: Address,
}

impl EventMeta {
    /// Stable `{txHash}-{logIndex}` identity of the event.
    pub fn event_id(&self) -> String {
        event_id(&self.tx_hash, self.log_index)
    }
}

/// Typed event parameters.
///
/// Claims are addressed by storage slot (`claim_slot`), disputes by the
/// arbitrator's dispute id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    // claim contract
    NewClaim {
        claim_slot: u64,
        claim_id: String,
        category: u64,
    },
    BalanceUpdate {
        claim_slot: u64,
        new_total: Amount,
    },
    TimelockStarted {
        claim_slot: u64,
    },
    ClaimWithdrawn {
        claim_slot: u64,
    },
    Debunked {
        claim_slot: u64,
    },
    Challenge {
        claim_slot: u64,
        challenger: Address,
        dispute_id: DisputeId,
    },
    DisputeCreated {
        arbitrator: Address,
        dispute_id: DisputeId,
        meta_evidence_id: u64,
        evidence_group_id: u64,
    },
    MetaEvidence {
        meta_evidence_id: u64,
        evidence: String,
    },
    Evidence {
        arbitrator: Address,
        evidence_group_id: u64,
        party: Address,
        evidence: String,
    },
    Contribution {
        dispute_id: DisputeId,
        round: u32,
        ruling: u64,
        contributor: Address,
        amount: Amount,
    },
    Withdrawal {
        dispute_id: DisputeId,
        round: u32,
        ruling: u64,
        contributor: Address,
        reward: Amount,
    },
    RulingFunded {
        dispute_id: DisputeId,
        round: u32,
        ruling: u64,
    },
    Ruling {
        arbitrator: Address,
        dispute_id: DisputeId,
        ruling: u64,
    },

    // arbitrator
    NewPeriod {
        dispute_id: DisputeId,
        period: u64,
    },
    NewPhase {
        phase: u64,
    },
    StakeSet {
        juror: Address,
        subcourt_id: u64,
        stake: Amount,
        new_total_stake: Amount,
    },
    ExecuteDelayedSetStakes {
        iterations: u64,
    },
    AppealPossible {
        dispute_id: DisputeId,
        arbitrable: Address,
    },
    AppealDecision {
        dispute_id: DisputeId,
        arbitrable: Address,
    },
    CastVote {
        dispute_id: DisputeId,
        vote_ids: Vec<u64>,
        choice: u64,
    },

    // policy registry
    PolicyUpdate {
        subcourt_id: u64,
        policy: String,
    },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewClaim { .. } => "NewClaim",
            Self::BalanceUpdate { .. } => "BalanceUpdate",
            Self::TimelockStarted { .. } => "TimelockStarted",
            Self::ClaimWithdrawn { .. } => "ClaimWithdrawal",
            Self::Debunked { .. } => "Debunked",
            Self::Challenge { .. } => "Challenge",
            Self::DisputeCreated { .. } => "Dispute",
            Self::MetaEvidence { .. } => "MetaEvidence",
            Self::Evidence { .. } => "Evidence",
            Self::Contribution { .. } => "Contribution",
            Self::Withdrawal { .. } => "Withdrawal",
            Self::RulingFunded { .. } => "RulingFunded",
            Self::Ruling { .. } => "Ruling",
            Self::NewPeriod { .. } => "NewPeriod",
            Self::NewPhase { .. } => "NewPhase",
            Self::StakeSet { .. } => "StakeSet",
            Self::ExecuteDelayedSetStakes { .. } => "ExecuteDelayedSetStakes",
            Self::AppealPossible { .. } => "AppealPossible",
            Self::AppealDecision { .. } => "AppealDecision",
            Self::CastVote { .. } => "CastVote",
            Self::PolicyUpdate { .. } => "PolicyUpdate",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEvent {
    pub meta: EventMeta,
    pub kind: EventKind,
}

impl ChainEvent {
    pub fn new(meta: EventMeta, kind: EventKind) -> Self {
        Self { meta, kind }
    }
}
