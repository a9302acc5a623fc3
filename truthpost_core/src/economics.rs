//! Round economics: appeal cost split and delayed-stake iteration capping.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codes::{PerRuling, RulingOption, RULING_SLOTS};
use crate::state::Amount;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomicsError {
    #[error("stake multiplier denominator is zero")]
    ZeroDenominator,
}

/// Winner/loser stake multipliers over a shared denominator, as configured on
/// the arbitrable contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeMultipliers {
    pub winner: Amount,
    pub loser: Amount,
    pub denominator: Amount,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppealCosts {
    pub winner: Amount,
    pub loser: Amount,
}

impl StakeMultipliers {
    /// `fee + fee * multiplier / denominator` for both sides, truncating.
    pub fn appeal_costs(&self, basic_fee: Amount) -> Result<AppealCosts, EconomicsError> {
        if self.denominator == 0 {
            return Err(EconomicsError::ZeroDenominator);
        }
        let side = |multiplier: Amount| {
            basic_fee.saturating_add(basic_fee.saturating_mul(multiplier) / self.denominator)
        };
        Ok(AppealCosts {
            winner: side(self.winner),
            loser: side(self.loser),
        })
    }
}

/// Amount each ruling option must raise to fund an appeal.
///
/// The leading option pays the winner cost, every other non-tied option the
/// loser cost. The tied slot never carries a target.
pub fn total_to_be_raised(leading: RulingOption, costs: AppealCosts) -> PerRuling<Amount> {
    let mut totals = [0; RULING_SLOTS];
    for option in RulingOption::ALL {
        if option.is_tied() {
            continue;
        }
        totals[option.index()] = if option == leading {
            costs.winner
        } else {
            costs.loser
        };
    }
    totals
}

/// Number of queued stake updates a batch execution actually applies.
///
/// Execution cannot move past the last queued update, whatever the caller asked for.
pub fn delayed_stake_iterations(requested: u64, next: u64, last: u64) -> u64 {
    requested.min(last.saturating_sub(next))
}
