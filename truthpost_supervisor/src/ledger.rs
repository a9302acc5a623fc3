//! Appeal crowdfunding ledger: contributions, rewards and the final ruling.

use std::collections::BTreeSet;

use tracing::{debug, error, info, warn};
use truthpost_core::score;
use truthpost_core::{
    contribution_id, reward_id, round_id, Address, Amount, ClaimStatus, Contribution, DisputeId,
    Reward, Round, RulingOption, User,
};

use crate::adapter::StoreExt;
use crate::error::MapperError;
use crate::supervisor::{Ctx, Outcome, SkipReason};

pub(crate) fn contribution(
    cx: &mut Ctx<'_>,
    dispute_id: DisputeId,
    round: u32,
    ruling: u64,
    contributor: &str,
    amount: Amount,
) -> Result<Outcome, MapperError> {
    let Some(mut dispute) = cx.dispute(dispute_id)? else {
        error!(dispute = dispute_id, "contribution to an unknown dispute");
        return Ok(Outcome::Skipped(SkipReason::UnknownDispute(dispute_id)));
    };
    let Some(mut stored) = cx.store.load::<Round>(&round_id(dispute_id, round))? else {
        error!(dispute = dispute_id, round, "contribution to an unknown round");
        return Ok(Outcome::Skipped(SkipReason::UnknownRound {
            dispute: dispute_id,
            round,
        }));
    };

    let claim = cx.claim(&dispute.claim_ref)?;
    cx.record("Contribution", &claim.id, Some(format!("{ruling}-{amount}-{contributor}")))?;

    if dispute.add_contributor(contributor) {
        cx.store.upsert(&dispute)?;
    }

    stored.raised_so_far = cx.reads.round_totals(&cx.meta.address, dispute_id, round)?;
    cx.store.upsert(&stored)?;

    let id = contribution_id(dispute_id, round, contributor, ruling);
    let entry = match cx.store.load::<Contribution>(&id)? {
        Some(mut existing) => {
            existing.amount = existing.amount.saturating_add(amount);
            existing
        }
        None => Contribution {
            id,
            amount,
            contributor: contributor.to_string(),
            withdrew: false,
        },
    };
    cx.store.upsert(&entry)?;

    cx.store.upsert(&User {
        id: contributor.to_string(),
    })?;

    let reward = reward_id(dispute_id, contributor);
    if !cx.store.exists::<Reward>(&reward)? {
        cx.store.upsert(&Reward {
            id: reward,
            total_withdrawable_amount: 0,
            withdrew: false,
            beneficiary: contributor.to_string(),
        })?;
    }

    debug!(
        dispute = dispute_id,
        round,
        ruling,
        contributor,
        %amount,
        total = %entry.amount,
        "contribution recorded"
    );
    Ok(Outcome::Applied)
}

pub(crate) fn withdrawal(
    cx: &mut Ctx<'_>,
    dispute_id: DisputeId,
    round: u32,
    ruling: u64,
    contributor: &str,
) -> Result<Outcome, MapperError> {
    let Some(dispute) = cx.dispute(dispute_id)? else {
        error!(dispute = dispute_id, "withdrawal from an unknown dispute");
        return Ok(Outcome::Skipped(SkipReason::UnknownDispute(dispute_id)));
    };
    let id = contribution_id(dispute_id, round, contributor, ruling);
    let Some(mut entry) = cx.store.load::<Contribution>(&id)? else {
        error!(contribution = %id, "withdrawal without a recorded contribution");
        return Ok(Outcome::Skipped(SkipReason::UnknownContribution(id)));
    };

    let reward_key = reward_id(dispute_id, contributor);
    let Some(mut reward) = cx.store.load::<Reward>(&reward_key)? else {
        warn!(reward = %reward_key, "withdrawal without a reward record");
        return Ok(Outcome::Skipped(SkipReason::UnknownReward(reward_key)));
    };

    let claim = cx.claim(&dispute.claim_ref)?;
    cx.record("Withdrawal", &claim.id, None)?;
    entry.amount = 0;
    entry.withdrew = true;
    cx.store.upsert(&entry)?;

    reward.total_withdrawable_amount =
        cx.reads.total_withdrawable(&cx.meta.address, dispute_id, contributor)?;
    if reward.total_withdrawable_amount == 0 {
        reward.withdrew = true;
    }
    cx.store.upsert(&reward)?;

    debug!(
        dispute = dispute_id,
        contributor,
        remaining = %reward.total_withdrawable_amount,
        "withdrawal recorded"
    );
    Ok(Outcome::Applied)
}

pub(crate) fn ruling_funded(
    cx: &mut Ctx<'_>,
    dispute_id: DisputeId,
    round: u32,
    ruling: u64,
) -> Result<Outcome, MapperError> {
    let Some(dispute) = cx.dispute(dispute_id)? else {
        error!(dispute = dispute_id, "funded ruling on an unknown dispute");
        return Ok(Outcome::Skipped(SkipReason::UnknownDispute(dispute_id)));
    };
    let Some(option) = RulingOption::from_code(ruling) else {
        error!(dispute = dispute_id, ruling, "funded ruling out of range");
        return Ok(Outcome::Skipped(SkipReason::RulingOutOfRange(ruling)));
    };
    let Some(mut stored) = cx.store.load::<Round>(&round_id(dispute_id, round))? else {
        error!(dispute = dispute_id, round, "funded ruling on an unknown round");
        return Ok(Outcome::Skipped(SkipReason::UnknownRound {
            dispute: dispute_id,
            round,
        }));
    };

    let claim = cx.claim(&dispute.claim_ref)?;
    cx.record("RulingFunded", &claim.id, Some(ruling.to_string()))?;

    stored.mark_paid(option);
    cx.store.upsert(&stored)?;
    Ok(Outcome::Applied)
}

/// Final ruling of a dispute.
///
/// Credits every distinct contributor once with what the arbitrable reports
/// as withdrawable, then settles the claim.
pub(crate) fn ruling(
    cx: &mut Ctx<'_>,
    arbitrator: &str,
    dispute_id: DisputeId,
    ruling: u64,
) -> Result<Outcome, MapperError> {
    let Some(mut dispute) = cx.dispute(dispute_id)? else {
        error!(dispute = dispute_id, "ruling for an unknown dispute");
        return Ok(Outcome::Skipped(SkipReason::UnknownDispute(dispute_id)));
    };

    let mut seen: BTreeSet<&Address> = BTreeSet::new();
    for contributor in &dispute.contributors {
        if !seen.insert(contributor) {
            continue;
        }
        let Some(mut reward) = cx.store.load::<Reward>(&reward_id(dispute_id, contributor))?
        else {
            warn!(
                dispute = dispute_id,
                contributor = %contributor,
                "contributor without a reward record"
            );
            continue;
        };
        let withdrawable =
            cx.reads.total_withdrawable(&cx.meta.address, dispute_id, contributor)?;
        reward.total_withdrawable_amount =
            reward.total_withdrawable_amount.saturating_add(withdrawable);
        cx.store.upsert(&reward)?;
    }
    let credited = seen.len();

    dispute.ruled = true;
    cx.store.upsert(&dispute)?;

    let mut claim = cx.claim(&dispute.claim_ref)?;
    if ruling == cx.cfg.debunk_ruling {
        score::terminate(&mut claim, cx.block(), ClaimStatus::Debunked);
    } else {
        claim.status = ClaimStatus::Live;
    }
    cx.store.upsert(&claim)?;
    cx.record_from("Ruling", &claim.id, Some(ruling.to_string()), arbitrator.to_string())?;

    info!(dispute = dispute_id, ruling, credited, status = ?claim.status, "dispute ruled");
    Ok(Outcome::Applied)
}
