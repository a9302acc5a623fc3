//! Fatal handler errors.
//!
//! Missing prerequisite entities are not errors: handlers log them and report
//! `Outcome::Skipped`. What ends up here is either an external failure or a
//! broken sequencing assumption that the host has to look at.

use thiserror::Error;
use truthpost_core::EconomicsError;

use crate::adapter::StoreError;
use crate::reads::ReadError;

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("no claim registered at storage slot {slot}")]
    ClaimStorageMissing { slot: u64 },

    #[error("claim entity {id} is referenced but missing")]
    ClaimEntityMissing { id: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("read model error: {0}")]
    Read(#[from] ReadError),

    #[error("round economics error: {0}")]
    Economics(#[from] EconomicsError),
}
