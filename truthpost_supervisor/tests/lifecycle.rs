mod common;

use common::*;
use truthpost_core::*;
use truthpost_supervisor::*;

#[test]
fn new_claim_materializes_claim_storage_and_arbitrator() {
    let mut sup = supervisor();
    assert_eq!(sup.handle(&new_claim(100), &reads()).unwrap(), Outcome::Applied);

    let storage: ClaimStorage = load(&sup, "4");
    assert_eq!(storage.claim_entity_id, "4-100");

    let claim: Claim = load(&sup, "4-100");
    assert_eq!(claim.owner, OWNER);
    assert_eq!(claim.status, ClaimStatus::Live);
    assert_eq!(claim.arbitrator_ref, ARBITRATOR);
    assert_eq!(claim.arbitrator_extra_data, "0x0001");
    assert_eq!(claim.created_at_timestamp, 1_200);

    let arbitrator: ArbitratorState = load(&sup, ARBITRATOR);
    assert_eq!(arbitrator.phase, Phase::Staking);
    assert_eq!(arbitrator.min_staking_time, 60);
    assert_eq!(arbitrator.next_delayed_set_stake, 10);

    let log: EventLog = load(&sup, &new_claim(100).meta.event_id());
    assert_eq!(log.name, "NewClaim");
    assert_eq!(log.related_claim, "4-100");
}

#[test]
fn reused_slot_points_at_the_newest_claim() {
    let mut sup = supervisor();
    let reads = reads();
    sup.handle(&new_claim(100), &reads).unwrap();
    sup.handle(&new_claim(500), &reads).unwrap();

    let storage: ClaimStorage = load(&sup, "4");
    assert_eq!(storage.claim_entity_id, "4-500");
    assert_eq!(sup.store().count::<Claim>(), 2);
}

#[test]
fn balance_updates_accumulate_score() {
    let mut sup = supervisor();
    let reads = reads();
    sup.handle(&new_claim(100), &reads).unwrap();

    sup.handle(&balance(110, 1000), &reads).unwrap();
    let claim: Claim = load(&sup, "4-100");
    assert_eq!(claim.last_calculated_score, 0);
    assert_eq!(claim.bounty, 1000);
    assert_eq!(claim.last_balance_update_block, 110);

    sup.handle(&balance(130, 500), &reads).unwrap();
    let claim: Claim = load(&sup, "4-100");
    assert_eq!(claim.last_calculated_score, 20_000);
    assert_eq!(claim.bounty, 500);
}

#[test]
fn stale_balance_update_is_skipped() {
    let mut sup = supervisor();
    let reads = reads();
    sup.handle(&new_claim(100), &reads).unwrap();
    sup.handle(&balance(130, 500), &reads).unwrap();

    let outcome = sup.handle(&balance(120, 9), &reads).unwrap();
    assert_eq!(
        outcome,
        Outcome::Skipped(SkipReason::StaleBlock {
            block: 120,
            last_update: 130
        })
    );
    let claim: Claim = load(&sup, "4-100");
    assert_eq!(claim.bounty, 500);
}

#[test]
fn timelock_then_withdrawal() {
    let mut sup = supervisor();
    let reads = reads();
    sup.handle(&new_claim(100), &reads).unwrap();
    sup.handle(&balance(110, 1000), &reads).unwrap();

    sup.handle(&on_claims(120, EventKind::TimelockStarted { claim_slot: SLOT }), &reads)
        .unwrap();
    let claim: Claim = load(&sup, "4-100");
    assert_eq!(claim.status, ClaimStatus::TimelockStarted);
    assert_eq!(claim.withdrawal_permitted_at, 120 * 12 + 600);
    assert_eq!(claim.last_calculated_score, 10_000);

    let withdraw = on_claims(125, EventKind::ClaimWithdrawn { claim_slot: SLOT });
    sup.handle(&withdraw, &reads).unwrap();
    let claim: Claim = load(&sup, "4-100");
    assert_eq!(claim.status, ClaimStatus::Withdrawn);
    assert_eq!((claim.bounty, claim.last_calculated_score), (0, 0));

    let log: EventLog = load(&sup, &withdraw.meta.event_id());
    assert_eq!(log.name, "ClaimWithdrawal");
    assert_eq!(log.details.as_deref(), Some("15000"));
}

#[test]
fn debunked_event_resets_claim() {
    let mut sup = supervisor();
    let reads = reads();
    sup.handle(&new_claim(100), &reads).unwrap();
    sup.handle(&balance(110, 1000), &reads).unwrap();
    sup.handle(&on_claims(150, EventKind::Debunked { claim_slot: SLOT }), &reads)
        .unwrap();

    let claim: Claim = load(&sup, "4-100");
    assert_eq!(claim.status, ClaimStatus::Debunked);
    assert_eq!((claim.bounty, claim.last_calculated_score), (0, 0));
    assert_eq!(claim.last_balance_update_block, 150);
}

#[test]
fn challenge_opens_dispute_court_and_first_round() {
    let sup = challenged(MaterializerCfg::default());

    let claim: Claim = load(&sup, "4-100");
    assert_eq!(claim.status, ClaimStatus::Challenged);
    assert_eq!(claim.challenger.as_deref(), Some(CHALLENGER));

    let court: Court = load(&sup, "0");
    assert!(court.hidden_votes);
    assert_eq!(court.times_per_period, [10, 20, 30, 40, 50]);

    let dispute: Dispute = load(&sup, "7");
    assert_eq!(dispute.claim_ref, "4-100");
    assert_eq!(dispute.period, Period::Evidence);
    assert_eq!(dispute.round_count, 1);

    let round: Round = load(&sup, "7-0");
    assert_eq!(round.jury_size, 3);
    // no ruling yet: both sides pay the loser cost, no appeal window
    assert_eq!(round.total_to_be_raised, [0, 120, 120]);
    assert_eq!(round.appeal_deadline, [0, 0, 0]);
    assert_eq!(scan_last_round_index(sup.store(), DISPUTE).unwrap(), Some(0));
}

#[test]
fn full_dispute_cycle() {
    let mut sup = challenged(MaterializerCfg::default());
    let voted = after_vote(reads(), 2);

    let vote = on_arbitrator(
        150,
        EventKind::CastVote {
            dispute_id: DISPUTE,
            vote_ids: vec![0, 1],
            choice: 2,
        },
    );
    assert_eq!(sup.handle(&vote, &reads()).unwrap(), Outcome::Applied);
    let round: Round = load(&sup, "7-0");
    assert_eq!(round.votes_per_choice, [0, 0, 2]);

    let to_appeal = on_arbitrator(160, EventKind::NewPeriod { dispute_id: DISPUTE, period: 3 });
    sup.handle(&to_appeal, &voted).unwrap();
    let dispute: Dispute = load(&sup, "7");
    assert_eq!(dispute.period, Period::Appeal);
    assert_eq!(dispute.ruling, 2);
    assert_eq!(dispute.last_period_change, 160 * 12);
    let round: Round = load(&sup, "7-0");
    assert_eq!(round.appeal_deadline, [0, 1_200, 1_300]);

    let possible = on_arbitrator(
        161,
        EventKind::AppealPossible {
            dispute_id: DISPUTE,
            arbitrable: ARBITRABLE.to_string(),
        },
    );
    sup.handle(&possible, &voted).unwrap();
    let round: Round = load(&sup, "7-0");
    assert_eq!(round.total_to_be_raised, [0, 120, 110]);

    let decision = on_arbitrator(
        170,
        EventKind::AppealDecision {
            dispute_id: DISPUTE,
            arbitrable: ARBITRABLE.to_string(),
        },
    );
    sup.handle(&decision, &voted).unwrap();
    let dispute: Dispute = load(&sup, "7");
    assert_eq!(dispute.round_count, 2);
    assert_eq!(dispute.period, Period::Evidence);
    let round: Round = load(&sup, "7-1");
    assert_eq!(round.jury_size, 7);
    assert_eq!(round.index, 1);

    let vote = on_arbitrator(
        180,
        EventKind::CastVote {
            dispute_id: DISPUTE,
            vote_ids: vec![4],
            choice: 1,
        },
    );
    sup.handle(&vote, &voted).unwrap();
    let round: Round = load(&sup, "7-1");
    assert_eq!(round.votes_per_choice, [0, 1, 0]);
    let first: Round = load(&sup, "7-0");
    assert_eq!(first.votes_per_choice, [0, 0, 2]);
}

#[test]
fn round_indices_stay_contiguous() {
    let mut sup = challenged(MaterializerCfg::default());
    let voted = after_vote(reads(), 1);

    for (n, block) in [200u64, 300].into_iter().enumerate() {
        let decision = on_arbitrator(
            block,
            EventKind::AppealDecision {
                dispute_id: DISPUTE,
                arbitrable: ARBITRABLE.to_string(),
            },
        );
        sup.handle(&decision, &voted).unwrap();

        let dispute: Dispute = load(&sup, "7");
        let counted = dispute.last_round_index();
        assert_eq!(counted, Some(n as u32 + 1));
        assert_eq!(scan_last_round_index(sup.store(), DISPUTE).unwrap(), counted);
    }
    for index in 0..3 {
        assert!(sup.store().exists::<Round>(&round_id(DISPUTE, index)).unwrap());
    }
    assert!(!sup.store().exists::<Round>(&round_id(DISPUTE, 3)).unwrap());
}

#[test]
fn appeal_decision_without_jury_size_is_fatal() {
    let mut sup = challenged(MaterializerCfg::default());
    let mut short = after_vote(reads(), 1);
    short.votes_lengths.insert(DISPUTE, vec![3]);
    let before = sup.store().snapshot();

    let decision = on_arbitrator(
        200,
        EventKind::AppealDecision {
            dispute_id: DISPUTE,
            arbitrable: ARBITRABLE.to_string(),
        },
    );
    let err = sup.handle(&decision, &short).unwrap_err();
    assert!(matches!(err, MapperError::Read(ReadError::Reverted(_))));
    assert_eq!(sup.store().snapshot(), before);
}

#[test]
fn appeal_cost_policy_refresh_uses_current_fees() {
    let mut sup = challenged(MaterializerCfg::default());
    let mut repriced = after_vote(reads(), 2);
    repriced.appeal_fees.insert(DISPUTE, 200);

    let possible = on_arbitrator(
        161,
        EventKind::AppealPossible {
            dispute_id: DISPUTE,
            arbitrable: ARBITRABLE.to_string(),
        },
    );
    sup.handle(&possible, &repriced).unwrap();
    let round: Round = load(&sup, "7-0");
    assert_eq!(round.total_to_be_raised, [0, 240, 220]);
}

#[test]
fn appeal_cost_policy_frozen_keeps_creation_totals() {
    let cfg = MaterializerCfg {
        appeal_costs: AppealCostPolicy::Frozen,
        ..MaterializerCfg::default()
    };
    let mut sup = challenged(cfg);
    let mut repriced = after_vote(reads(), 2);
    repriced.appeal_fees.insert(DISPUTE, 200);

    let possible = on_arbitrator(
        161,
        EventKind::AppealPossible {
            dispute_id: DISPUTE,
            arbitrable: ARBITRABLE.to_string(),
        },
    );
    assert_eq!(sup.handle(&possible, &repriced).unwrap(), Outcome::Applied);
    let round: Round = load(&sup, "7-0");
    assert_eq!(round.total_to_be_raised, [0, 120, 120]);
}

#[test]
fn vote_on_missing_round_is_skipped() {
    let sup = challenged(MaterializerCfg::default());
    let mut store = sup.into_store();
    let mut dispute: Dispute = store.load("7").unwrap().unwrap();
    dispute.round_count = 2;
    store.upsert(&dispute).unwrap();
    let mut sup = Supervisor::new(store, MaterializerCfg::default());

    let vote = on_arbitrator(
        150,
        EventKind::CastVote {
            dispute_id: DISPUTE,
            vote_ids: vec![0],
            choice: 1,
        },
    );
    let outcome = sup.handle(&vote, &reads()).unwrap();
    assert_eq!(
        outcome,
        Outcome::Skipped(SkipReason::UnknownRound {
            dispute: DISPUTE,
            round: 1
        })
    );
    let round: Round = load(&sup, "7-0");
    assert_eq!(round.votes_per_choice, [0, 0, 0]);
}

#[test]
fn foreign_dispute_events_are_skipped() {
    let mut sup = challenged(MaterializerCfg::default());
    let reads = reads();

    let vote = on_arbitrator(
        150,
        EventKind::CastVote {
            dispute_id: 99,
            vote_ids: vec![0],
            choice: 1,
        },
    );
    assert_eq!(
        sup.handle(&vote, &reads).unwrap(),
        Outcome::Skipped(SkipReason::UnknownDispute(99))
    );

    let period = on_arbitrator(151, EventKind::NewPeriod { dispute_id: 99, period: 1 });
    assert_eq!(
        sup.handle(&period, &reads).unwrap(),
        Outcome::Skipped(SkipReason::UnknownDispute(99))
    );
}

#[test]
fn vote_choice_out_of_range_is_skipped() {
    let mut sup = challenged(MaterializerCfg::default());
    let vote = on_arbitrator(
        150,
        EventKind::CastVote {
            dispute_id: DISPUTE,
            vote_ids: vec![0],
            choice: 5,
        },
    );
    assert_eq!(
        sup.handle(&vote, &reads()).unwrap(),
        Outcome::Skipped(SkipReason::RulingOutOfRange(5))
    );
}

#[test]
fn unknown_period_code_is_kept_as_unknown() {
    let mut sup = challenged(MaterializerCfg::default());
    let period = on_arbitrator(150, EventKind::NewPeriod { dispute_id: DISPUTE, period: 9 });
    sup.handle(&period, &reads()).unwrap();

    let dispute: Dispute = load(&sup, "7");
    assert_eq!(dispute.period, Period::Unknown);
}

#[test]
fn phase_change_refreshes_arbitrator() {
    let mut sup = supervisor();
    sup.handle(&new_claim(100), &reads()).unwrap();

    let mut later = reads();
    later.arbitrator_params.min_staking_time = 90;
    sup.handle(&on_arbitrator(110, EventKind::NewPhase { phase: 2 }), &later)
        .unwrap();

    let state: ArbitratorState = load(&sup, ARBITRATOR);
    assert_eq!(state.phase, Phase::Drawing);
    assert_eq!(state.last_phase_change, 110 * 12);
    assert_eq!(state.min_staking_time, 90);

    sup.handle(&on_arbitrator(111, EventKind::NewPhase { phase: 7 }), &later)
        .unwrap();
    let state: ArbitratorState = load(&sup, ARBITRATOR);
    assert_eq!(state.phase, Phase::Unknown);
}

#[test]
fn stake_set_refreshes_queue_position() {
    let mut sup = supervisor();
    sup.handle(&new_claim(100), &reads()).unwrap();

    let mut later = reads();
    later.arbitrator_params.next_delayed_set_stake = 12;
    let stake = on_arbitrator(
        110,
        EventKind::StakeSet {
            juror: "0xjuror".to_string(),
            subcourt_id: 0,
            stake: 500,
            new_total_stake: 500,
        },
    );
    sup.handle(&stake, &later).unwrap();

    let state: ArbitratorState = load(&sup, ARBITRATOR);
    assert_eq!(state.next_delayed_set_stake, 12);
}

#[test]
fn delayed_stake_execution_is_capped() {
    let mut sup = supervisor();
    sup.handle(&new_claim(100), &reads()).unwrap();

    let exec = on_arbitrator(110, EventKind::ExecuteDelayedSetStakes { iterations: 50 });
    sup.handle(&exec, &reads()).unwrap();

    let state: ArbitratorState = load(&sup, ARBITRATOR);
    assert_eq!(state.next_delayed_set_stake, 40);
    assert_eq!(state.last_delayed_set_stake, 40);
}

#[test]
fn delayed_stake_execution_starts_from_the_read_queue_head() {
    let mut sup = supervisor();
    sup.handle(&new_claim(100), &reads()).unwrap();

    // the cached head is still 10; the contract has moved on to 30
    let mut moved = reads();
    moved.arbitrator_params.next_delayed_set_stake = 30;
    let exec = on_arbitrator(110, EventKind::ExecuteDelayedSetStakes { iterations: 5 });
    sup.handle(&exec, &moved).unwrap();

    let state: ArbitratorState = load(&sup, ARBITRATOR);
    assert_eq!(state.next_delayed_set_stake, 35);
    assert_eq!(state.last_delayed_set_stake, 40);
}

#[test]
fn redelivered_delayed_stake_execution_is_stable_without_ledger() {
    let cfg = MaterializerCfg {
        skip_replays: false,
        ..MaterializerCfg::default()
    };
    let mut sup = Supervisor::new(MemoryStore::new(), cfg);
    sup.handle(&new_claim(100), &reads()).unwrap();

    let exec = on_arbitrator(110, EventKind::ExecuteDelayedSetStakes { iterations: 5 });
    assert_eq!(sup.handle(&exec, &reads()).unwrap(), Outcome::Applied);
    let once: ArbitratorState = load(&sup, ARBITRATOR);
    assert_eq!(sup.handle(&exec, &reads()).unwrap(), Outcome::Applied);
    let twice: ArbitratorState = load(&sup, ARBITRATOR);

    assert_eq!(once.next_delayed_set_stake, 15);
    assert_eq!(once, twice);
}

#[test]
fn arbitrator_events_before_any_claim_are_skipped() {
    let mut sup = supervisor();
    let outcome = sup
        .handle(&on_arbitrator(110, EventKind::NewPhase { phase: 1 }), &reads())
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::Skipped(SkipReason::UnknownArbitrator(ARBITRATOR.to_string()))
    );
}

#[test]
fn policy_update_keeps_court_configuration() {
    let mut sup = challenged(MaterializerCfg::default());
    let update = ChainEvent::new(
        meta(POLICY_REGISTRY, 150, 0),
        EventKind::PolicyUpdate {
            subcourt_id: 0,
            policy: "/ipfs/policy.json".to_string(),
        },
    );
    sup.handle(&update, &reads()).unwrap();

    let court: Court = load(&sup, "0");
    assert_eq!(court.policy_uri.as_deref(), Some("/ipfs/policy.json"));
    assert!(court.hidden_votes);

    let fresh = ChainEvent::new(
        meta(POLICY_REGISTRY, 151, 0),
        EventKind::PolicyUpdate {
            subcourt_id: 3,
            policy: "/ipfs/other.json".to_string(),
        },
    );
    sup.handle(&fresh, &reads()).unwrap();
    let court: Court = load(&sup, "3");
    assert!(!court.hidden_votes);
    assert_eq!(court.times_per_period, [0; COURT_PERIODS]);
}

#[test]
fn evidence_is_logged_against_the_disputed_claim() {
    let mut sup = challenged(MaterializerCfg::default());
    let evidence = on_claims(
        150,
        EventKind::Evidence {
            arbitrator: ARBITRATOR.to_string(),
            evidence_group_id: DISPUTE,
            party: CHALLENGER.to_string(),
            evidence: "/ipfs/evidence.json".to_string(),
        },
    );
    sup.handle(&evidence, &reads()).unwrap();

    let log: EventLog = load(&sup, &evidence.meta.event_id());
    assert_eq!(log.name, "Evidence");
    assert_eq!(log.related_claim, "4-100");
    assert_eq!(log.from.as_deref(), Some(CHALLENGER));
    assert_eq!(log.details.as_deref(), Some("/ipfs/evidence.json"));

    let orphan = on_claims(
        151,
        EventKind::Evidence {
            arbitrator: ARBITRATOR.to_string(),
            evidence_group_id: 42,
            party: CHALLENGER.to_string(),
            evidence: "/ipfs/orphan.json".to_string(),
        },
    );
    assert_eq!(
        sup.handle(&orphan, &reads()).unwrap(),
        Outcome::Skipped(SkipReason::UnknownDispute(42))
    );
}

#[test]
fn meta_evidence_is_stored() {
    let mut sup = supervisor();
    let event = on_claims(
        90,
        EventKind::MetaEvidence {
            meta_evidence_id: 0,
            evidence: "/ipfs/meta.json".to_string(),
        },
    );
    sup.handle(&event, &reads()).unwrap();
    let meta: MetaEvidence = load(&sup, "0");
    assert_eq!(meta.uri, "/ipfs/meta.json");

    let arbitrable: Arbitrable = load(&sup, ARBITRABLE_ID);
    assert_eq!(arbitrable.address, ARBITRABLE);
    assert_eq!(arbitrable.network, "mainnet");
}
