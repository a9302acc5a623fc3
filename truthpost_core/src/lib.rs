pub mod codes;
pub mod state;

pub mod cfg;
pub mod economics;
pub mod score;

pub use codes::{
    ClaimStatus, Period, Phase, PerRuling, RulingOption, NUMBER_OF_RULING_OPTIONS, RULING_SLOTS,
};
pub use state::{
    Address, Amount, Arbitrable, ArbitratorState, Claim, ClaimStorage, Contribution, Court,
    Dispute, DisputeId, Entity, EventLog, MetaEvidence, ProcessedEvent, Reward, Round, User,
    ARBITRABLE_ID, COURT_PERIODS,
};
pub use state::{claim_entity_id, contribution_id, event_id, reward_id, round_id};
pub use cfg::{AppealCostPolicy, CfgError, MaterializerCfg};
pub use economics::{
    delayed_stake_iterations, total_to_be_raised, AppealCosts, EconomicsError, StakeMultipliers,
};
pub use score::Accrual;
