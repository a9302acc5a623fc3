//! Closed enumerations behind the raw numeric codes emitted on chain.
//!
//! Every table maps an out-of-range code to an explicit `Unknown` value so a
//! protocol upgrade shows up in the materialized data instead of being folded
//! into a valid state.

use serde::{Deserialize, Serialize};

/// Number of real ruling options; index 0 ("tied") comes on top of these.
pub const NUMBER_OF_RULING_OPTIONS: usize = 2;

/// Length of every per-ruling array on a round.
pub const RULING_SLOTS: usize = NUMBER_OF_RULING_OPTIONS + 1;

/// One value per ruling option, index 0 being the tied/refused option.
pub type PerRuling<T> = [T; RULING_SLOTS];

/// Ruling outcomes of a claim dispute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RulingOption {
    Tied,
    ChallengeFailed,
    Debunked,
}

impl RulingOption {
    pub const ALL: [RulingOption; RULING_SLOTS] = [
        RulingOption::Tied,
        RulingOption::ChallengeFailed,
        RulingOption::Debunked,
    ];

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Tied),
            1 => Some(Self::ChallengeFailed),
            2 => Some(Self::Debunked),
            _ => None,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_tied(self) -> bool {
        matches!(self, Self::Tied)
    }
}

/// Per-dispute period of the arbitrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Evidence,
    Commit,
    Vote,
    Appeal,
    Execution,
    Unknown,
}

impl Period {
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => Self::Evidence,
            1 => Self::Commit,
            2 => Self::Vote,
            3 => Self::Appeal,
            4 => Self::Execution,
            _ => Self::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Evidence => "evidence",
            Self::Commit => "commit",
            Self::Vote => "vote",
            Self::Appeal => "appeal",
            Self::Execution => "execution",
            Self::Unknown => "unknown",
        }
    }
}

/// Global phase of the arbitrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Staking,
    Generating,
    Drawing,
    Unknown,
}

impl Phase {
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => Self::Staking,
            1 => Self::Generating,
            2 => Self::Drawing,
            _ => Self::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Staking => "staking",
            Self::Generating => "generating",
            Self::Drawing => "drawing",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    Live,
    Challenged,
    TimelockStarted,
    Debunked,
    Withdrawn,
}

impl ClaimStatus {
    /// Terminal statuses zero both the bounty and the accumulated score.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Debunked | Self::Withdrawn)
    }
}
