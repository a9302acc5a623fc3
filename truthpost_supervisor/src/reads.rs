//! External read-model adapter.
//!
//! Read-only, point-in-time queries against the arbitrable (claim) contract and
//! the arbitrator. The host hands the supervisor a `ReadModel` bound to the
//! block of the event being processed; from the handlers' point of view every
//! call is a pure function of its arguments.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use truthpost_core::{
    reward_id, round_id, Address, Amount, DisputeId, PerRuling, RulingOption, StakeMultipliers,
    COURT_PERIODS,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("contract call reverted: {0}")]
    Reverted(String),

    #[error("read model unavailable: {0}")]
    Unavailable(String),
}

/// Arbitrator-wide parameters cached on `ArbitratorState`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbitratorParams {
    pub phase: u64,
    pub last_phase_change: u64,
    pub min_staking_time: u64,
    pub next_delayed_set_stake: u64,
    pub last_delayed_set_stake: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtConfig {
    pub hidden_votes: bool,
    pub times_per_period: [u64; COURT_PERIODS],
}

/// Appeal window of one ruling option.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppealPeriod {
    pub start: u64,
    pub end: u64,
}

pub trait ReadModel {
    // arbitrable (claim) contract

    fn arbitrator(&self, arbitrable: &str) -> Result<Address, ReadError>;

    fn category_extra_data(&self, arbitrable: &str, category: u64) -> Result<String, ReadError>;

    fn claim_withdrawal_timelock(&self, arbitrable: &str) -> Result<u64, ReadError>;

    fn appeal_fee(&self, arbitrable: &str, dispute: DisputeId) -> Result<Amount, ReadError>;

    fn stake_multipliers(&self, arbitrable: &str) -> Result<StakeMultipliers, ReadError>;

    /// Ruling currently leading the dispute's last round (0 when tied).
    fn last_round_winner(&self, arbitrable: &str, dispute: DisputeId) -> Result<u64, ReadError>;

    fn appeal_period(
        &self,
        arbitrable: &str,
        dispute: DisputeId,
        ruling: RulingOption,
    ) -> Result<AppealPeriod, ReadError>;

    /// Live crowdfunding totals per ruling option for one round.
    fn round_totals(
        &self,
        arbitrable: &str,
        dispute: DisputeId,
        round: u32,
    ) -> Result<PerRuling<Amount>, ReadError>;

    /// What `contributor` could withdraw across all rounds of the dispute.
    fn total_withdrawable(
        &self,
        arbitrable: &str,
        dispute: DisputeId,
        contributor: &str,
    ) -> Result<Amount, ReadError>;

    // arbitrator

    fn arbitrator_params(&self, arbitrator: &str) -> Result<ArbitratorParams, ReadError>;

    fn dispute_subcourt(&self, arbitrator: &str, dispute: DisputeId) -> Result<u64, ReadError>;

    fn court_config(&self, arbitrator: &str, court: u64) -> Result<CourtConfig, ReadError>;

    /// Jury size of every round opened so far.
    fn votes_lengths(&self, arbitrator: &str, dispute: DisputeId) -> Result<Vec<u64>, ReadError>;

    fn current_ruling(&self, arbitrator: &str, dispute: DisputeId) -> Result<u64, ReadError>;
}

/// Deterministic read model backed by plain maps.
///
/// Intended for tests and fixture replays: it models one arbitrable and one
/// arbitrator, so contract addresses are ignored. Unset mapping entries read
/// as zero, the same as an unset contract mapping; unknown disputes and unset
/// multipliers revert.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticReadModel {
    pub arbitrator: Address,
    pub category_extra_data: BTreeMap<u64, String>,
    pub claim_withdrawal_timelock: u64,
    pub appeal_fees: BTreeMap<DisputeId, Amount>,
    pub multipliers: Option<StakeMultipliers>,
    pub last_round_winners: BTreeMap<DisputeId, u64>,
    pub appeal_periods: BTreeMap<DisputeId, PerRuling<AppealPeriod>>,
    /// Keyed by round id (`{dispute}-{round}`).
    pub round_totals: BTreeMap<String, PerRuling<Amount>>,
    /// Keyed by reward id (`{dispute}-{contributor}`).
    pub withdrawable: BTreeMap<String, Amount>,
    pub arbitrator_params: ArbitratorParams,
    pub subcourts: BTreeMap<DisputeId, u64>,
    pub courts: BTreeMap<u64, CourtConfig>,
    pub votes_lengths: BTreeMap<DisputeId, Vec<u64>>,
    pub current_rulings: BTreeMap<DisputeId, u64>,
}

impl ReadModel for StaticReadModel {
    fn arbitrator(&self, _arbitrable: &str) -> Result<Address, ReadError> {
        Ok(self.arbitrator.clone())
    }

    fn category_extra_data(&self, _arbitrable: &str, category: u64) -> Result<String, ReadError> {
        Ok(self.category_extra_data.get(&category).cloned().unwrap_or_default())
    }

    fn claim_withdrawal_timelock(&self, _arbitrable: &str) -> Result<u64, ReadError> {
        Ok(self.claim_withdrawal_timelock)
    }

    fn appeal_fee(&self, _arbitrable: &str, dispute: DisputeId) -> Result<Amount, ReadError> {
        Ok(self.appeal_fees.get(&dispute).copied().unwrap_or_default())
    }

    fn stake_multipliers(&self, _arbitrable: &str) -> Result<StakeMultipliers, ReadError> {
        self.multipliers
            .ok_or_else(|| ReadError::Reverted("stake multipliers not configured".into()))
    }

    fn last_round_winner(&self, _arbitrable: &str, dispute: DisputeId) -> Result<u64, ReadError> {
        Ok(self.last_round_winners.get(&dispute).copied().unwrap_or_default())
    }

    fn appeal_period(
        &self,
        _arbitrable: &str,
        dispute: DisputeId,
        ruling: RulingOption,
    ) -> Result<AppealPeriod, ReadError> {
        Ok(self
            .appeal_periods
            .get(&dispute)
            .map(|periods| periods[ruling.index()])
            .unwrap_or_default())
    }

    fn round_totals(
        &self,
        _arbitrable: &str,
        dispute: DisputeId,
        round: u32,
    ) -> Result<PerRuling<Amount>, ReadError> {
        Ok(self
            .round_totals
            .get(&round_id(dispute, round))
            .copied()
            .unwrap_or_default())
    }

    fn total_withdrawable(
        &self,
        _arbitrable: &str,
        dispute: DisputeId,
        contributor: &str,
    ) -> Result<Amount, ReadError> {
        Ok(self
            .withdrawable
            .get(&reward_id(dispute, contributor))
            .copied()
            .unwrap_or_default())
    }

    fn arbitrator_params(&self, _arbitrator: &str) -> Result<ArbitratorParams, ReadError> {
        Ok(self.arbitrator_params)
    }

    fn dispute_subcourt(&self, _arbitrator: &str, dispute: DisputeId) -> Result<u64, ReadError> {
        self.subcourts
            .get(&dispute)
            .copied()
            .ok_or_else(|| ReadError::Reverted(format!("dispute {dispute} does not exist")))
    }

    fn court_config(&self, _arbitrator: &str, court: u64) -> Result<CourtConfig, ReadError> {
        Ok(self.courts.get(&court).copied().unwrap_or_default())
    }

    fn votes_lengths(&self, _arbitrator: &str, dispute: DisputeId) -> Result<Vec<u64>, ReadError> {
        self.votes_lengths
            .get(&dispute)
            .cloned()
            .ok_or_else(|| ReadError::Reverted(format!("dispute {dispute} does not exist")))
    }

    fn current_ruling(&self, _arbitrator: &str, dispute: DisputeId) -> Result<u64, ReadError> {
        Ok(self.current_rulings.get(&dispute).copied().unwrap_or_default())
    }
}
