//! Drive a keeper over an in-memory store with a synthetic load profile.

use crate::{
    config::{FeeModelConfig, LoadSegment},
    error::Result,
    keeper::{BlockOutcome, Keeper},
    store::MemStore,
};

/// Block-by-block gas usage described by a repeating load profile. An empty
/// profile yields empty blocks.
pub fn block_gas_schedule(load: &[LoadSegment], blocks: u64) -> impl Iterator<Item = u64> + '_ {
    let profile = load
        .iter()
        .flat_map(|segment| (0..segment.blocks).map(move |_| segment.gas))
        .cycle()
        .chain(std::iter::repeat(0));
    profile.take(usize::try_from(blocks).unwrap_or(usize::MAX))
}

/// Summary of one simulated block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockSummary {
    pub height: u64,
    pub outcome: BlockOutcome,
}

pub struct Simulator {
    keeper: Keeper<MemStore>,
    height: u64,
}

impl Simulator {
    /// Fresh chain initialised from the configured genesis.
    pub fn new(config: &FeeModelConfig) -> Result<Self> {
        let mut keeper = Keeper::new(MemStore::new(), config.keeper_config());
        keeper.init_genesis(&config.genesis())?;
        Ok(Self { keeper, height: 0 })
    }

    pub fn keeper(&self) -> &Keeper<MemStore> {
        &self.keeper
    }

    pub fn keeper_mut(&mut self) -> &mut Keeper<MemStore> {
        &mut self.keeper
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    /// Produce one block consuming `gas`, capped at the block gas limit.
    pub fn step(&mut self, gas: u64) -> Result<BlockSummary> {
        let max_block_gas = self.keeper.params()?.model.max_block_gas;

        self.keeper.begin_block();
        self.keeper.track_gas(gas.min(max_block_gas))?;
        let outcome = self.keeper.end_block()?;
        self.height += 1;

        Ok(BlockSummary {
            height: self.height,
            outcome,
        })
    }

    /// Run every block of the configured simulation.
    pub fn run(&mut self, config: &FeeModelConfig) -> Result<Vec<BlockSummary>> {
        block_gas_schedule(&config.simulation.load, config.simulation.blocks)
            .map(|gas| self.step(gas))
            .collect()
    }
}
