//! Claim contract handlers: claim lifecycle, challenges and evidence.

use tracing::{debug, info, warn};
use truthpost_core::score::{self, Accrual};
use truthpost_core::{
    claim_entity_id, Amount, Arbitrable, ArbitratorState, Claim, ClaimStatus, ClaimStorage, Court,
    Dispute, DisputeId, MetaEvidence, Period, Phase, ARBITRABLE_ID,
};

use crate::adapter::StoreExt;
use crate::arbitrator::refresh_arbitrator;
use crate::error::MapperError;
use crate::reads::ReadError;
use crate::rounds::create_round;
use crate::supervisor::{Ctx, Outcome, SkipReason};

pub(crate) fn new_claim(
    cx: &mut Ctx<'_>,
    slot: u64,
    claim_id: &str,
    category: u64,
) -> Result<Outcome, MapperError> {
    let arbitrable = cx.meta.address.clone();
    let block = cx.block();

    let storage = ClaimStorage {
        id: slot.to_string(),
        claim_entity_id: claim_entity_id(slot, block),
    };
    cx.store.upsert(&storage)?;

    let arbitrator = cx.reads.arbitrator(&arbitrable)?;
    let claim = Claim {
        id: storage.claim_entity_id,
        external_claim_id: claim_id.to_string(),
        owner: cx.meta.from.clone(),
        category,
        status: ClaimStatus::Live,
        bounty: 0,
        withdrawal_permitted_at: 0,
        last_balance_update_block: block,
        last_calculated_score: 0,
        created_at_block: block,
        created_at_timestamp: cx.timestamp(),
        arbitrator_ref: arbitrator.clone(),
        arbitrator_extra_data: cx.reads.category_extra_data(&arbitrable, category)?,
        challenger: None,
    };

    let params = cx.reads.arbitrator_params(&arbitrator)?;
    let mut state = cx
        .store
        .load::<ArbitratorState>(&arbitrator)?
        .unwrap_or_else(|| ArbitratorState::new(arbitrator.clone()));
    refresh_arbitrator(&mut state, &params);
    state.phase = Phase::from_code(params.phase);
    state.last_phase_change = params.last_phase_change;
    cx.store.upsert(&state)?;

    cx.store.upsert(&claim)?;
    cx.record("NewClaim", &claim.id, Some(category.to_string()))?;
    info!(claim = %claim.id, slot, "claim created");
    Ok(Outcome::Applied)
}

pub(crate) fn balance_update(
    cx: &mut Ctx<'_>,
    slot: u64,
    new_total: Amount,
) -> Result<Outcome, MapperError> {
    let mut claim = cx.claim_at_slot(slot)?;
    let last_update = claim.last_balance_update_block;

    if score::update_bounty(&mut claim, cx.block(), new_total) == Accrual::Stale {
        return Ok(Outcome::Skipped(SkipReason::StaleBlock {
            block: cx.block(),
            last_update,
        }));
    }
    claim.status = ClaimStatus::Live;
    cx.store.upsert(&claim)?;

    cx.record("BalanceUpdate", &claim.id, Some(new_total.to_string()))?;
    Ok(Outcome::Applied)
}

pub(crate) fn timelock_started(cx: &mut Ctx<'_>, slot: u64) -> Result<Outcome, MapperError> {
    let mut claim = cx.claim_at_slot(slot)?;

    let timelock = cx.reads.claim_withdrawal_timelock(&cx.meta.address)?;
    let permitted_at = cx.timestamp().saturating_add(timelock);

    if score::accrue(&mut claim, cx.block()) == Accrual::Stale {
        warn!(claim = %claim.id, "timelock start older than last balance update");
    }
    claim.status = ClaimStatus::TimelockStarted;
    claim.withdrawal_permitted_at = permitted_at;
    cx.store.upsert(&claim)?;

    cx.record("TimelockStarted", &claim.id, Some(permitted_at.to_string()))?;
    Ok(Outcome::Applied)
}

pub(crate) fn claim_withdrawn(cx: &mut Ctx<'_>, slot: u64) -> Result<Outcome, MapperError> {
    let mut claim = cx.claim_at_slot(slot)?;
    let final_score = score::terminate(&mut claim, cx.block(), ClaimStatus::Withdrawn);
    cx.store.upsert(&claim)?;

    cx.record("ClaimWithdrawal", &claim.id, Some(final_score.to_string()))?;
    info!(claim = %claim.id, %final_score, "claim withdrawn");
    Ok(Outcome::Applied)
}

pub(crate) fn debunked(cx: &mut Ctx<'_>, slot: u64) -> Result<Outcome, MapperError> {
    let mut claim = cx.claim_at_slot(slot)?;
    score::terminate(&mut claim, cx.block(), ClaimStatus::Debunked);
    cx.store.upsert(&claim)?;

    cx.record("Debunked", &claim.id, None)?;
    info!(claim = %claim.id, "claim debunked");
    Ok(Outcome::Applied)
}

/// A challenge opens the dispute, its court and round 0.
pub(crate) fn challenge(
    cx: &mut Ctx<'_>,
    slot: u64,
    challenger: &str,
    dispute_id: DisputeId,
) -> Result<Outcome, MapperError> {
    let arbitrable = cx.meta.address.clone();
    let arbitrator = cx.reads.arbitrator(&arbitrable)?;

    let court_id = cx.reads.dispute_subcourt(&arbitrator, dispute_id)?;
    let config = cx.reads.court_config(&arbitrator, court_id)?;
    let mut court = cx
        .store
        .load::<Court>(&court_id.to_string())?
        .unwrap_or_else(|| Court::new(court_id.to_string()));
    court.hidden_votes = config.hidden_votes;
    court.times_per_period = config.times_per_period;
    cx.store.upsert(&court)?;

    let mut claim = cx.claim_at_slot(slot)?;
    claim.status = ClaimStatus::Challenged;
    claim.challenger = Some(challenger.to_string());
    cx.store.upsert(&claim)?;
    cx.record("Challenge", &claim.id, None)?;

    let mut dispute = cx.dispute(dispute_id)?.unwrap_or_else(|| Dispute {
        id: dispute_id.to_string(),
        claim_ref: claim.id.clone(),
        court_ref: court.id.clone(),
        arbitrable: arbitrable.clone(),
        period: Period::Evidence,
        last_period_change: 0,
        ruling: 0,
        ruled: false,
        contributors: Vec::new(),
        round_count: 0,
    });
    dispute.claim_ref = claim.id.clone();
    dispute.court_ref = court.id.clone();
    dispute.period = Period::Evidence;
    dispute.last_period_change = cx.timestamp();

    if dispute.round_count == 0 {
        let jury_size = cx
            .reads
            .votes_lengths(&arbitrator, dispute_id)?
            .first()
            .copied()
            .ok_or_else(|| {
                ReadError::Reverted(format!("dispute {dispute_id} has no first round"))
            })?;
        create_round(cx, dispute_id, 0, jury_size, &arbitrable)?;
        dispute.round_count = 1;
    }
    cx.store.upsert(&dispute)?;

    info!(claim = %claim.id, dispute = dispute_id, court = court_id, "claim challenged");
    Ok(Outcome::Applied)
}

/// The arbitrable's own dispute notification carries nothing the challenge
/// handler does not already materialize.
pub(crate) fn dispute_created(
    cx: &mut Ctx<'_>,
    dispute_id: DisputeId,
    meta_evidence_id: u64,
) -> Result<Outcome, MapperError> {
    debug!(
        dispute = dispute_id,
        meta_evidence_id,
        arbitrable = %cx.meta.address,
        "dispute created"
    );
    Ok(Outcome::Applied)
}

/// Meta-evidence registration also identifies the arbitrable contract.
pub(crate) fn meta_evidence(
    cx: &mut Ctx<'_>,
    meta_evidence_id: u64,
    uri: &str,
) -> Result<Outcome, MapperError> {
    cx.store.upsert(&MetaEvidence {
        id: meta_evidence_id.to_string(),
        uri: uri.to_string(),
    })?;
    cx.store.upsert(&Arbitrable {
        id: ARBITRABLE_ID.to_string(),
        address: cx.meta.address.clone(),
        network: cx.cfg.network.clone(),
    })?;
    Ok(Outcome::Applied)
}

/// Evidence groups are keyed by dispute id.
pub(crate) fn evidence(
    cx: &mut Ctx<'_>,
    group_id: u64,
    party: &str,
    uri: &str,
) -> Result<Outcome, MapperError> {
    let Some(dispute) = cx.dispute(group_id)? else {
        debug!(group_id, "evidence for an unknown dispute");
        return Ok(Outcome::Skipped(SkipReason::UnknownDispute(group_id)));
    };
    cx.record_from(
        "Evidence",
        &dispute.claim_ref,
        Some(uri.to_string()),
        party.to_string(),
    )?;
    Ok(Outcome::Applied)
}
