//! Event supervisor.
//!
//! Owns the entity store and applies one event at a time:
//! - drops re-deliveries of an already processed event id
//! - routes the event to its handler
//! - stages every write of that event and commits them together
//!
//! No IO, no async. The host supplies a `ReadModel` bound to the event's block.

use thiserror::Error;
use tracing::{debug, error, info_span, warn};
use truthpost_core::{
    Address, Claim, ClaimStorage, Dispute, DisputeId, EventLog, MaterializerCfg, ProcessedEvent,
};

use crate::adapter::{commit, EntityStore, Staged, StoreExt};
use crate::error::MapperError;
use crate::events::{ChainEvent, EventKind, EventMeta};
use crate::reads::ReadModel;
use crate::{arbitrator, claims, ledger};

/// Why a handler left the entity graph unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    UnknownDispute(DisputeId),
    UnknownArbitrator(Address),
    NoRounds(DisputeId),
    UnknownRound { dispute: DisputeId, round: u32 },
    UnknownContribution(String),
    UnknownReward(String),
    RulingOutOfRange(u64),
    StaleBlock { block: u64, last_update: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Skipped(SkipReason),
    /// The event id was already processed; nothing was done.
    Replayed,
}

/// Per-event result returned by `Supervisor::ingest`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandledEvent {
    pub event_id: String,
    pub name: &'static str,
    pub outcome: Outcome,
}

#[derive(Error, Debug)]
#[error("event {event_id} (#{index} in batch) failed: {source}")]
pub struct IngestError {
    pub index: usize,
    pub event_id: String,
    #[source]
    pub source: MapperError,
}

/// What a handler sees while processing one event.
pub(crate) struct Ctx<'a> {
    pub cfg: &'a MaterializerCfg,
    pub store: &'a mut dyn EntityStore,
    pub reads: &'a dyn ReadModel,
    pub meta: &'a EventMeta,
}

impl Ctx<'_> {
    pub fn block(&self) -> u64 {
        self.meta.block_number
    }

    pub fn timestamp(&self) -> u64 {
        self.meta.block_timestamp
    }

    /// Claim currently living in a storage slot.
    ///
    /// Claim events only exist for created claims, so a miss here means the
    /// stream and the store disagree: fatal.
    pub fn claim_at_slot(&self, slot: u64) -> Result<Claim, MapperError> {
        let Some(storage) = self.store.load::<ClaimStorage>(&slot.to_string())? else {
            error!(slot, "no claim at storage slot; this cannot happen with an ordered stream");
            return Err(MapperError::ClaimStorageMissing { slot });
        };
        self.claim(&storage.claim_entity_id)
    }

    pub fn claim(&self, id: &str) -> Result<Claim, MapperError> {
        match self.store.load::<Claim>(id)? {
            Some(claim) => Ok(claim),
            None => {
                error!(
                    claim = id,
                    "claim entity missing; this cannot happen with an ordered stream"
                );
                Err(MapperError::ClaimEntityMissing { id: id.to_string() })
            }
        }
    }

    pub fn dispute(&self, id: DisputeId) -> Result<Option<Dispute>, MapperError> {
        Ok(self.store.load::<Dispute>(&id.to_string())?)
    }

    /// Append an audit record attributed to the transaction sender.
    pub fn record(
        &mut self,
        name: &str,
        related_claim: &str,
        details: Option<String>,
    ) -> Result<(), MapperError> {
        let from = self.meta.from.clone();
        self.record_from(name, related_claim, details, from)
    }

    pub fn record_from(
        &mut self,
        name: &str,
        related_claim: &str,
        details: Option<String>,
        from: Address,
    ) -> Result<(), MapperError> {
        let log = EventLog {
            id: self.meta.event_id(),
            name: name.to_string(),
            related_claim: related_claim.to_string(),
            details,
            from: Some(from),
            timestamp: self.timestamp(),
        };
        self.store.upsert(&log)?;
        Ok(())
    }
}

fn dispatch(cx: &mut Ctx<'_>, kind: &EventKind) -> Result<Outcome, MapperError> {
    match kind {
        EventKind::NewClaim { claim_slot, claim_id, category } => {
            claims::new_claim(cx, *claim_slot, claim_id, *category)
        }
        EventKind::BalanceUpdate { claim_slot, new_total } => {
            claims::balance_update(cx, *claim_slot, *new_total)
        }
        EventKind::TimelockStarted { claim_slot } => claims::timelock_started(cx, *claim_slot),
        EventKind::ClaimWithdrawn { claim_slot } => claims::claim_withdrawn(cx, *claim_slot),
        EventKind::Debunked { claim_slot } => claims::debunked(cx, *claim_slot),
        EventKind::Challenge { claim_slot, challenger, dispute_id } => {
            claims::challenge(cx, *claim_slot, challenger, *dispute_id)
        }
        EventKind::DisputeCreated { dispute_id, meta_evidence_id, .. } => {
            claims::dispute_created(cx, *dispute_id, *meta_evidence_id)
        }
        EventKind::MetaEvidence { meta_evidence_id, evidence } => {
            claims::meta_evidence(cx, *meta_evidence_id, evidence)
        }
        EventKind::Evidence { evidence_group_id, party, evidence, .. } => {
            claims::evidence(cx, *evidence_group_id, party, evidence)
        }
        EventKind::Contribution { dispute_id, round, ruling, contributor, amount } => {
            ledger::contribution(cx, *dispute_id, *round, *ruling, contributor, *amount)
        }
        EventKind::Withdrawal { dispute_id, round, ruling, contributor, .. } => {
            ledger::withdrawal(cx, *dispute_id, *round, *ruling, contributor)
        }
        EventKind::RulingFunded { dispute_id, round, ruling } => {
            ledger::ruling_funded(cx, *dispute_id, *round, *ruling)
        }
        EventKind::Ruling { arbitrator, dispute_id, ruling } => {
            ledger::ruling(cx, arbitrator, *dispute_id, *ruling)
        }
        EventKind::NewPeriod { dispute_id, period } => {
            arbitrator::new_period(cx, *dispute_id, *period)
        }
        EventKind::NewPhase { phase } => arbitrator::new_phase(cx, *phase),
        EventKind::StakeSet { .. } => arbitrator::stake_set(cx),
        EventKind::ExecuteDelayedSetStakes { iterations } => {
            arbitrator::execute_delayed_set_stakes(cx, *iterations)
        }
        EventKind::AppealPossible { dispute_id, arbitrable } => {
            arbitrator::appeal_possible(cx, *dispute_id, arbitrable)
        }
        EventKind::AppealDecision { dispute_id, arbitrable } => {
            arbitrator::appeal_decision(cx, *dispute_id, arbitrable)
        }
        EventKind::CastVote { dispute_id, vote_ids, choice } => {
            arbitrator::cast_vote(cx, *dispute_id, vote_ids.len(), *choice)
        }
        EventKind::PolicyUpdate { subcourt_id, policy } => {
            arbitrator::policy_update(cx, *subcourt_id, policy)
        }
    }
}

#[derive(Debug)]
pub struct Supervisor<S: EntityStore> {
    cfg: MaterializerCfg,
    store: S,
}

impl<S: EntityStore> Supervisor<S> {
    pub fn new(store: S, cfg: MaterializerCfg) -> Self {
        Self { cfg, store }
    }

    pub fn cfg(&self) -> &MaterializerCfg {
        &self.cfg
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Apply one event.
    ///
    /// Either every write of the event is committed, or (on `Err`) none is, so
    /// the host can retry the same event from scratch.
    pub fn handle(
        &mut self,
        event: &ChainEvent,
        reads: &dyn ReadModel,
    ) -> Result<Outcome, MapperError> {
        let event_id = event.meta.event_id();
        let span = info_span!(
            "event",
            id = %event_id,
            kind = event.kind.name(),
            block = event.meta.block_number
        );
        let _enter = span.enter();

        if self.cfg.skip_replays && self.store.exists::<ProcessedEvent>(&event_id)? {
            debug!("event already processed");
            return Ok(Outcome::Replayed);
        }

        let (outcome, writes) = {
            let mut staged = Staged::new(&self.store);
            let outcome = {
                let mut cx = Ctx {
                    cfg: &self.cfg,
                    store: &mut staged,
                    reads,
                    meta: &event.meta,
                };
                dispatch(&mut cx, &event.kind)?
            };
            if self.cfg.skip_replays {
                staged.upsert(&ProcessedEvent {
                    id: event_id.clone(),
                    block: event.meta.block_number,
                })?;
            }
            (outcome, staged.into_writes())
        };

        let written = writes.len();
        commit(&mut self.store, writes)?;

        match &outcome {
            Outcome::Skipped(reason) => warn!(?reason, "event skipped"),
            _ => debug!(written, "event applied"),
        }
        Ok(outcome)
    }

    /// Apply a batch in order, stopping at the first fatal error.
    ///
    /// `reads_at` builds the read model for each event's block.
    pub fn ingest<R, F>(
        &mut self,
        events: &[ChainEvent],
        mut reads_at: F,
    ) -> Result<Vec<HandledEvent>, IngestError>
    where
        R: ReadModel,
        F: FnMut(&EventMeta) -> R,
    {
        let mut out = Vec::with_capacity(events.len());
        for (index, event) in events.iter().enumerate() {
            let reads = reads_at(&event.meta);
            let outcome = self.handle(event, &reads).map_err(|source| IngestError {
                index,
                event_id: event.meta.event_id(),
                source,
            })?;
            out.push(HandledEvent {
                event_id: event.meta.event_id(),
                name: event.kind.name(),
                outcome,
            });
        }
        Ok(out)
    }
}
