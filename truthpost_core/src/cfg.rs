use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CfgError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which fee parameters price a round's appeal crowdfunding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppealCostPolicy {
    /// Appeal-possible recomputes the totals with the fees current at that block.
    #[default]
    Refresh,
    /// Totals computed at round creation stay authoritative.
    Frozen,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaterializerCfg {
    #[serde(default)]
    pub appeal_costs: AppealCostPolicy,

    /// Ruling code that debunks the challenged claim.
    #[serde(default = "default_debunk_ruling")]
    pub debunk_ruling: u64,

    /// Remember processed event ids and treat re-deliveries as no-ops.
    #[serde(default = "default_true")]
    pub skip_replays: bool,

    /// Chain the indexed contracts live on, recorded on the `Arbitrable` entity.
    #[serde(default = "default_network")]
    pub network: String,
}

fn default_debunk_ruling() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

fn default_network() -> String {
    "mainnet".to_string()
}

impl Default for MaterializerCfg {
    fn default() -> Self {
        Self {
            appeal_costs: AppealCostPolicy::default(),
            debunk_ruling: default_debunk_ruling(),
            skip_replays: true,
            network: default_network(),
        }
    }
}

impl MaterializerCfg {
    pub fn from_toml_str(content: &str) -> Result<Self, CfgError> {
        Ok(toml::from_str(content)?)
    }

    /// Load config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CfgError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
