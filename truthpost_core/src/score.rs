//! Time-weighted bounty score.
//!
//! A claim's score is the area under its bounty-vs-block step function since
//! the last reset: every bounty change first closes the running interval
//! `(block - last_balance_update_block) * bounty`, then moves the bounty.

use crate::codes::ClaimStatus;
use crate::state::{Amount, Claim};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accrual {
    Applied,
    /// The block is older than the claim's last update; nothing changed.
    Stale,
}

/// Close the interval ending at `block`.
pub fn accrue(claim: &mut Claim, block: u64) -> Accrual {
    let Some(elapsed) = block.checked_sub(claim.last_balance_update_block) else {
        return Accrual::Stale;
    };
    let area = (elapsed as Amount).saturating_mul(claim.bounty);
    claim.last_calculated_score = claim.last_calculated_score.saturating_add(area);
    claim.last_balance_update_block = block;
    Accrual::Applied
}

/// Accrue up to `block`, then switch to the new bounty total.
///
/// A stale update leaves the claim untouched, so an old event replayed after
/// newer ones cannot roll the bounty back.
pub fn update_bounty(claim: &mut Claim, block: u64, new_total: Amount) -> Accrual {
    let accrual = accrue(claim, block);
    if accrual == Accrual::Applied {
        claim.bounty = new_total;
    }
    accrual
}

/// Move the claim into a terminal status, zeroing bounty and score.
///
/// Returns the score the claim had accumulated up to `block`.
pub fn terminate(claim: &mut Claim, block: u64, status: ClaimStatus) -> Amount {
    debug_assert!(status.is_terminal());
    accrue(claim, block);
    let final_score = claim.last_calculated_score;
    claim.status = status;
    claim.bounty = 0;
    claim.last_calculated_score = 0;
    claim.last_balance_update_block = claim.last_balance_update_block.max(block);
    final_score
}
