//! truthpost_supervisor
//!
//! Outside-world facing layer for `truthpost_core`.
//!
//! Responsibilities:
//! - own the entity store behind the `EntityStore` adapter
//! - route typed chain events to their handlers
//! - query the arbitrable and arbitrator through an injected `ReadModel`
//! - commit each event's writes atomically and drop re-deliveries
//!
//! Non-goals:
//! - no IO
//! - no async
//! - no chain decoding (the host delivers typed events)

pub mod adapter;
pub mod error;
pub mod events;
pub mod reads;
pub mod rounds;
pub mod supervisor;

mod arbitrator;
mod claims;
mod ledger;

pub use adapter::{
    EntityStore, MemoryStore, RestoreStats, Staged, StoreError, StoreExt, StoreSnapshot,
};

pub use error::MapperError;

pub use events::{ChainEvent, EventKind, EventMeta};

pub use reads::{AppealPeriod, ArbitratorParams, CourtConfig, ReadError, ReadModel, StaticReadModel};

pub use rounds::scan_last_round_index;

pub use supervisor::{HandledEvent, IngestError, Outcome, SkipReason, Supervisor};
