//! Arbitrator and policy registry handlers.
//!
//! Arbitrator events are global: disputes raised by other arbitrables show up
//! here too. Those have no `Dispute` entity and are skipped quietly.

use tracing::{debug, error, info, warn};
use truthpost_core::{
    delayed_stake_iterations, round_id, AppealCostPolicy, ArbitratorState, Court, Dispute,
    DisputeId, Period, Phase, Round, RulingOption,
};

use crate::adapter::StoreExt;
use crate::error::MapperError;
use crate::reads::{ArbitratorParams, ReadError};
use crate::rounds::{appeal_deadlines, appeal_totals, create_round, leading_ruling};
use crate::supervisor::{Ctx, Outcome, SkipReason};

/// Copy the re-readable staking parameters onto the cached arbitrator state.
pub(crate) fn refresh_arbitrator(state: &mut ArbitratorState, params: &ArbitratorParams) {
    state.min_staking_time = params.min_staking_time;
    state.next_delayed_set_stake = params.next_delayed_set_stake;
    state.last_delayed_set_stake = params.last_delayed_set_stake;
}

fn known_dispute(cx: &Ctx<'_>, dispute_id: DisputeId) -> Result<Option<Dispute>, MapperError> {
    let dispute = cx.dispute(dispute_id)?;
    if dispute.is_none() {
        debug!(dispute = dispute_id, "dispute not raised by a tracked arbitrable");
    }
    Ok(dispute)
}

fn known_arbitrator(cx: &Ctx<'_>) -> Result<Option<ArbitratorState>, MapperError> {
    let state = cx.store.load::<ArbitratorState>(&cx.meta.address)?;
    if state.is_none() {
        debug!(arbitrator = %cx.meta.address, "arbitrator not referenced by any claim");
    }
    Ok(state)
}

pub(crate) fn new_period(
    cx: &mut Ctx<'_>,
    dispute_id: DisputeId,
    code: u64,
) -> Result<Outcome, MapperError> {
    let Some(mut dispute) = known_dispute(cx, dispute_id)? else {
        return Ok(Outcome::Skipped(SkipReason::UnknownDispute(dispute_id)));
    };

    let period = Period::from_code(code);
    if period == Period::Unknown {
        warn!(dispute = dispute_id, code, "unknown period code");
    }

    dispute.ruling = cx.reads.current_ruling(&cx.meta.address, dispute_id)?;
    dispute.period = period;
    dispute.last_period_change = cx.timestamp();

    if period == Period::Appeal {
        if let Some(index) = dispute.last_round_index() {
            refresh_deadlines(cx, dispute_id, &dispute.arbitrable, index)?;
        }
    }
    cx.store.upsert(&dispute)?;

    debug!(dispute = dispute_id, period = period.name(), ruling = dispute.ruling, "period changed");
    Ok(Outcome::Applied)
}

/// Entering the appeal period fixes the appeal windows of the last round.
fn refresh_deadlines(
    cx: &mut Ctx<'_>,
    dispute_id: DisputeId,
    arbitrable: &str,
    index: u32,
) -> Result<(), MapperError> {
    let Some(mut round) = cx.store.load::<Round>(&round_id(dispute_id, index))? else {
        error!(dispute = dispute_id, round = index, "round counted on dispute but not stored");
        return Ok(());
    };
    if leading_ruling(cx.reads, arbitrable, dispute_id)?.is_tied() {
        return Ok(());
    }
    round.appeal_deadline = appeal_deadlines(cx.reads, arbitrable, dispute_id)?;
    cx.store.upsert(&round)?;
    Ok(())
}

pub(crate) fn new_phase(cx: &mut Ctx<'_>, code: u64) -> Result<Outcome, MapperError> {
    let Some(mut state) = known_arbitrator(cx)? else {
        return Ok(Outcome::Skipped(SkipReason::UnknownArbitrator(cx.meta.address.clone())));
    };

    let phase = Phase::from_code(code);
    if phase == Phase::Unknown {
        warn!(code, "unknown phase code");
    }

    let params = cx.reads.arbitrator_params(&state.id)?;
    refresh_arbitrator(&mut state, &params);
    state.phase = phase;
    state.last_phase_change = cx.timestamp();
    cx.store.upsert(&state)?;

    info!(arbitrator = %state.id, phase = phase.name(), "phase changed");
    Ok(Outcome::Applied)
}

pub(crate) fn stake_set(cx: &mut Ctx<'_>) -> Result<Outcome, MapperError> {
    let Some(mut state) = known_arbitrator(cx)? else {
        return Ok(Outcome::Skipped(SkipReason::UnknownArbitrator(cx.meta.address.clone())));
    };
    let params = cx.reads.arbitrator_params(&state.id)?;
    refresh_arbitrator(&mut state, &params);
    cx.store.upsert(&state)?;
    Ok(Outcome::Applied)
}

/// Batch execution of queued stake updates.
///
/// The queue position is re-read at the event's block; the head cannot move
/// past the last queued update.
pub(crate) fn execute_delayed_set_stakes(
    cx: &mut Ctx<'_>,
    requested: u64,
) -> Result<Outcome, MapperError> {
    let Some(mut state) = known_arbitrator(cx)? else {
        return Ok(Outcome::Skipped(SkipReason::UnknownArbitrator(cx.meta.address.clone())));
    };
    let params = cx.reads.arbitrator_params(&state.id)?;
    let next = params.next_delayed_set_stake;
    let last = params.last_delayed_set_stake;

    let applied = delayed_stake_iterations(requested, next, last);
    state.min_staking_time = params.min_staking_time;
    state.last_delayed_set_stake = last;
    state.next_delayed_set_stake = next.saturating_add(applied);
    cx.store.upsert(&state)?;

    debug!(requested, applied, next = state.next_delayed_set_stake, "delayed stakes executed");
    Ok(Outcome::Applied)
}

/// The funding window of the last round opened.
pub(crate) fn appeal_possible(
    cx: &mut Ctx<'_>,
    dispute_id: DisputeId,
    arbitrable: &str,
) -> Result<Outcome, MapperError> {
    let Some(dispute) = known_dispute(cx, dispute_id)? else {
        return Ok(Outcome::Skipped(SkipReason::UnknownDispute(dispute_id)));
    };
    let Some(index) = dispute.last_round_index() else {
        error!(dispute = dispute_id, "appeal possible on a dispute without rounds");
        return Ok(Outcome::Skipped(SkipReason::NoRounds(dispute_id)));
    };
    let Some(mut round) = cx.store.load::<Round>(&round_id(dispute_id, index))? else {
        error!(dispute = dispute_id, round = index, "round not found");
        return Ok(Outcome::Skipped(SkipReason::UnknownRound {
            dispute: dispute_id,
            round: index,
        }));
    };

    if cx.cfg.appeal_costs == AppealCostPolicy::Frozen {
        debug!(dispute = dispute_id, round = index, "keeping round creation totals");
        return Ok(Outcome::Applied);
    }

    let leading = leading_ruling(cx.reads, arbitrable, dispute_id)?;
    round.total_to_be_raised = appeal_totals(cx.reads, arbitrable, dispute_id, leading)?;
    cx.store.upsert(&round)?;

    debug!(
        dispute = dispute_id,
        round = index,
        ?leading,
        totals = ?round.total_to_be_raised,
        "appeal totals refreshed"
    );
    Ok(Outcome::Applied)
}

/// The arbitrator accepted an appeal: open the next round.
pub(crate) fn appeal_decision(
    cx: &mut Ctx<'_>,
    dispute_id: DisputeId,
    arbitrable: &str,
) -> Result<Outcome, MapperError> {
    let Some(mut dispute) = known_dispute(cx, dispute_id)? else {
        return Ok(Outcome::Skipped(SkipReason::UnknownDispute(dispute_id)));
    };

    let index = dispute.round_count;
    let jury_size = cx
        .reads
        .votes_lengths(&cx.meta.address, dispute_id)?
        .get(index as usize)
        .copied()
        .ok_or_else(|| {
            ReadError::Reverted(format!(
                "dispute {dispute_id} has no votes length for round {index}"
            ))
        })?;

    create_round(cx, dispute_id, index, jury_size, arbitrable)?;
    dispute.round_count = index + 1;
    dispute.period = Period::Evidence;
    cx.store.upsert(&dispute)?;

    info!(dispute = dispute_id, round = index, jury_size, "appeal round opened");
    Ok(Outcome::Applied)
}

/// Votes land on the dispute's last round.
pub(crate) fn cast_vote(
    cx: &mut Ctx<'_>,
    dispute_id: DisputeId,
    vote_count: usize,
    choice: u64,
) -> Result<Outcome, MapperError> {
    let Some(dispute) = known_dispute(cx, dispute_id)? else {
        return Ok(Outcome::Skipped(SkipReason::UnknownDispute(dispute_id)));
    };
    let Some(index) = dispute.last_round_index() else {
        error!(dispute = dispute_id, "vote cast on a dispute without rounds");
        return Ok(Outcome::Skipped(SkipReason::NoRounds(dispute_id)));
    };
    let Some(mut round) = cx.store.load::<Round>(&round_id(dispute_id, index))? else {
        error!(dispute = dispute_id, round = index, "no round for cast vote");
        return Ok(Outcome::Skipped(SkipReason::UnknownRound {
            dispute: dispute_id,
            round: index,
        }));
    };
    let Some(option) = RulingOption::from_code(choice) else {
        error!(dispute = dispute_id, choice, "vote choice out of range");
        return Ok(Outcome::Skipped(SkipReason::RulingOutOfRange(choice)));
    };

    let slot = &mut round.votes_per_choice[option.index()];
    *slot = slot.saturating_add(vote_count as u64);
    cx.store.upsert(&round)?;

    debug!(dispute = dispute_id, round = index, ?option, vote_count, "votes cast");
    Ok(Outcome::Applied)
}

pub(crate) fn policy_update(
    cx: &mut Ctx<'_>,
    subcourt_id: u64,
    policy: &str,
) -> Result<Outcome, MapperError> {
    let id = subcourt_id.to_string();
    let mut court = cx.store.load::<Court>(&id)?.unwrap_or_else(|| Court::new(id));
    court.policy_uri = Some(policy.to_string());
    cx.store.upsert(&court)?;

    info!(court = subcourt_id, policy, "court policy updated");
    Ok(Outcome::Applied)
}
