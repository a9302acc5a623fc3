#![allow(dead_code)]

use std::collections::BTreeMap;

use truthpost_core::{Amount, DisputeId, MaterializerCfg, StakeMultipliers};
use truthpost_supervisor::*;

pub const ARBITRABLE: &str = "0xtruthpost";
pub const ARBITRATOR: &str = "0xkleros";
pub const POLICY_REGISTRY: &str = "0xpolicy";
pub const OWNER: &str = "0xowner";
pub const CHALLENGER: &str = "0xchallenger";

pub const SLOT: u64 = 4;
pub const DISPUTE: DisputeId = 7;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn reads() -> StaticReadModel {
    StaticReadModel {
        arbitrator: ARBITRATOR.to_string(),
        category_extra_data: BTreeMap::from([(1, "0x0001".to_string())]),
        claim_withdrawal_timelock: 600,
        appeal_fees: BTreeMap::from([(DISPUTE, 100)]),
        multipliers: Some(StakeMultipliers {
            winner: 1,
            loser: 2,
            denominator: 10,
        }),
        subcourts: BTreeMap::from([(DISPUTE, 0)]),
        courts: BTreeMap::from([(
            0,
            CourtConfig {
                hidden_votes: true,
                times_per_period: [10, 20, 30, 40, 50],
            },
        )]),
        votes_lengths: BTreeMap::from([(DISPUTE, vec![3, 7, 15])]),
        arbitrator_params: ArbitratorParams {
            phase: 0,
            last_phase_change: 50,
            min_staking_time: 60,
            next_delayed_set_stake: 10,
            last_delayed_set_stake: 40,
        },
        ..StaticReadModel::default()
    }
}

/// Leading ruling and appeal windows once the jury voted `winner`.
pub fn after_vote(mut reads: StaticReadModel, winner: u64) -> StaticReadModel {
    reads.last_round_winners.insert(DISPUTE, winner);
    reads.current_rulings.insert(DISPUTE, winner);
    reads.appeal_periods.insert(
        DISPUTE,
        [
            AppealPeriod::default(),
            AppealPeriod { start: 1_000, end: 1_200 },
            AppealPeriod { start: 1_000, end: 1_300 },
        ],
    );
    reads
}

pub fn meta(address: &str, block: u64, log_index: u64) -> EventMeta {
    EventMeta {
        address: address.to_string(),
        block_number: block,
        block_timestamp: block * 12,
        tx_hash: format!("0xtx{block}"),
        log_index,
        from: OWNER.to_string(),
    }
}

pub fn on_claims(block: u64, kind: EventKind) -> ChainEvent {
    ChainEvent::new(meta(ARBITRABLE, block, 0), kind)
}

pub fn on_arbitrator(block: u64, kind: EventKind) -> ChainEvent {
    ChainEvent::new(meta(ARBITRATOR, block, 1), kind)
}

pub fn new_claim(block: u64) -> ChainEvent {
    on_claims(
        block,
        EventKind::NewClaim {
            claim_slot: SLOT,
            claim_id: "ipfs://article".to_string(),
            category: 1,
        },
    )
}

pub fn balance(block: u64, new_total: Amount) -> ChainEvent {
    on_claims(block, EventKind::BalanceUpdate { claim_slot: SLOT, new_total })
}

pub fn challenge(block: u64) -> ChainEvent {
    let mut event = on_claims(
        block,
        EventKind::Challenge {
            claim_slot: SLOT,
            challenger: CHALLENGER.to_string(),
            dispute_id: DISPUTE,
        },
    );
    event.meta.from = CHALLENGER.to_string();
    event
}

pub fn contribution(
    block: u64,
    log_index: u64,
    round: u32,
    ruling: u64,
    contributor: &str,
    amount: Amount,
) -> ChainEvent {
    let mut event = on_claims(
        block,
        EventKind::Contribution {
            dispute_id: DISPUTE,
            round,
            ruling,
            contributor: contributor.to_string(),
            amount,
        },
    );
    event.meta.log_index = log_index;
    event
}

pub fn supervisor() -> Supervisor<MemoryStore> {
    init_tracing();
    Supervisor::new(MemoryStore::new(), MaterializerCfg::default())
}

/// Claim created at block 100 and challenged at block 140 under dispute 7.
pub fn challenged(cfg: MaterializerCfg) -> Supervisor<MemoryStore> {
    init_tracing();
    let mut sup = Supervisor::new(MemoryStore::new(), cfg);
    let reads = reads();
    assert_eq!(sup.handle(&new_claim(100), &reads).unwrap(), Outcome::Applied);
    assert_eq!(sup.handle(&balance(110, 1000), &reads).unwrap(), Outcome::Applied);
    assert_eq!(sup.handle(&challenge(140), &reads).unwrap(), Outcome::Applied);
    sup
}

pub fn load<E: truthpost_core::Entity>(sup: &Supervisor<MemoryStore>, id: &str) -> E {
    sup.store()
        .load::<E>(id)
        .unwrap()
        .unwrap_or_else(|| panic!("{} {id} not stored", E::KIND))
}
