//! TOML configuration for hosts and the simulator.
//!
//! ```toml
//! [module]
//! authority = "core10d07y265gmmuvt4z0w9aw880jnsr700jgrnlvc"
//! fee_denom = "ucore"
//!
//! [params]
//! initial_gas_price = "0.0625"
//! max_gas_price_multiplier = "1000"
//! max_discount = "0.5"
//! escalation_start_fraction = "0.8"
//! max_block_gas = 50000000
//! short_ema_block_length = 50
//! long_ema_block_length = 1000
//!
//! [simulation]
//! blocks = 200
//!
//! [[simulation.load]]
//! blocks = 100
//! gas = 45000000
//!
//! [[simulation.load]]
//! blocks = 100
//! gas = 0
//! ```

use crate::{
    decimal::validate_denom,
    genesis::GenesisState,
    keeper::KeeperConfig,
    params::{ModelParams, Params},
};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeModelConfig {
    #[serde(default)]
    pub module: ModuleConfig,

    /// Overrides the default curve parameters when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<ModelParams>,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Address allowed to update params
    #[serde(default = "default_authority")]
    pub authority: String,

    /// Denom of the published minimum gas price
    #[serde(default = "default_fee_denom")]
    pub fee_denom: String,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            authority: default_authority(),
            fee_denom: default_fee_denom(),
        }
    }
}

fn default_authority() -> String {
    "core10d07y265gmmuvt4z0w9aw880jnsr700jgrnlvc".to_string()
}

fn default_fee_denom() -> String {
    "ucore".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of blocks to simulate
    #[serde(default = "default_simulation_blocks")]
    pub blocks: u64,

    /// Gas used per block. Segments run in order and the profile repeats
    /// until `blocks` blocks have been produced.
    #[serde(default)]
    pub load: Vec<LoadSegment>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            blocks: default_simulation_blocks(),
            load: Vec::new(),
        }
    }
}

fn default_simulation_blocks() -> u64 {
    100
}

/// `blocks` consecutive blocks each consuming `gas`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSegment {
    pub blocks: u64,
    pub gas: u64,
}

impl FeeModelConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.module.authority.trim().is_empty() {
            bail!("module.authority must not be empty");
        }
        validate_denom(&self.module.fee_denom).context("module.fee_denom")?;
        self.params().validate_basic().context("params")?;
        if self.simulation.load.iter().any(|segment| segment.blocks == 0) {
            bail!("simulation.load segments must span at least one block");
        }
        Ok(())
    }

    pub fn params(&self) -> Params {
        Params::new(self.params.clone().unwrap_or_default())
    }

    pub fn keeper_config(&self) -> KeeperConfig {
        KeeperConfig {
            authority: self.module.authority.clone(),
        }
    }

    /// Genesis with the configured params, publishing their initial price.
    pub fn genesis(&self) -> GenesisState {
        let params = self.params();
        let mut genesis = GenesisState::new_default(self.module.fee_denom.clone());
        genesis.min_gas_price.amount = params.model.initial_gas_price;
        genesis.params = params;
        genesis
    }
}
