//! Fee model simulation CLI.
//!
//! Inspect the gas price curve and replay load profiles against the
//! block lifecycle.

#[cfg(feature = "cli")]
mod cli {
    use anyhow::{Context, Result};
    use clap::{Parser, Subcommand};
    use coreum_feemodel::{
        FeeModelConfig, GenesisState, Model, Querier, QueryRecommendedGasPriceRequest, Simulator,
    };
    use std::{
        fs,
        path::{Path, PathBuf},
    };
    use tracing::info;

    #[derive(Parser)]
    #[command(name = "feemodel-sim")]
    #[command(about = "Explore the dynamic minimum gas price model")]
    pub struct Cli {
        /// Path to a TOML config file (defaults apply when omitted)
        #[arg(short, long, global = true)]
        pub config: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(short, long, global = true)]
        pub verbose: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Subcommand)]
    pub enum Command {
        /// Print the price along the short EMA axis
        Curve {
            /// Long EMA held fixed while the short EMA varies
            #[arg(short, long, default_value = "0")]
            long_ema: u64,

            /// Number of sample points
            #[arg(short = 'n', long, default_value = "20")]
            samples: u64,
        },

        /// Replay the configured load profile block by block
        Simulate {
            /// Print every Nth block
            #[arg(short, long, default_value = "1")]
            every: u64,
        },

        /// Print a genesis section as JSON
        Genesis {
            /// Fee denom, overriding the config
            #[arg(short, long)]
            denom: Option<String>,
        },

        /// Validate a genesis JSON file
        ValidateGenesis {
            /// Genesis file
            file: PathBuf,
        },

        /// Run the simulation, then print the recommended price range
        Recommend {
            /// Blocks until inclusion
            #[arg(short, long, default_value = "10")]
            after: u32,
        },
    }

    pub fn run(cli: Cli) -> Result<()> {
        let config = match &cli.config {
            Some(path) => FeeModelConfig::load(path)?,
            None => FeeModelConfig::default(),
        };

        match cli.command {
            Command::Curve { long_ema, samples } => run_curve(&config, long_ema, samples),
            Command::Simulate { every } => run_simulate(&config, every),
            Command::Genesis { denom } => run_genesis(config, denom),
            Command::ValidateGenesis { file } => run_validate_genesis(&file),
            Command::Recommend { after } => run_recommend(&config, after),
        }
    }

    fn run_curve(config: &FeeModelConfig, long_ema: u64, samples: u64) -> Result<()> {
        let model = Model::new(config.params().model);
        let max_block_gas = model.params().max_block_gas;
        let samples = samples.max(1);

        println!("Gas Price Curve");
        println!("===============");
        println!(
            "initial: {}  discounted: {}  max: {}  escalation start: {}",
            model.params().initial_gas_price,
            model.gas_price_with_max_discount(),
            model.max_gas_price(),
            model.escalation_start_block_gas()
        );
        println!("long EMA: {long_ema}\n");

        println!("{:>14} {:>6} {:>28}", "Short EMA", "Fill", "Price");
        println!("{:-<14} {:-<6} {:-<28}", "", "", "");

        for i in 0..=samples {
            let short_ema =
                u64::try_from(u128::from(max_block_gas) * u128::from(i) / u128::from(samples))
                    .unwrap_or(u64::MAX);
            println!(
                "{:>14} {:>5}% {:>28}",
                short_ema,
                i * 100 / samples,
                model.calculate_next_gas_price(short_ema, long_ema).to_string()
            );
        }
        Ok(())
    }

    fn run_simulate(config: &FeeModelConfig, every: u64) -> Result<()> {
        let mut sim = Simulator::new(config)?;
        let blocks = sim.run(config)?;
        let every = every.max(1);

        println!("{:>8} {:>14} {:>14} {:>14} {:>28}", "Height", "Gas", "Short EMA", "Long EMA", "Min Gas Price");
        println!("{:-<8} {:-<14} {:-<14} {:-<14} {:-<28}", "", "", "", "", "");

        for block in blocks.iter().filter(|b| b.height % every == 0) {
            println!(
                "{:>8} {:>14} {:>14} {:>14} {:>28}",
                block.height,
                block.outcome.tracked_gas,
                block.outcome.short_ema,
                block.outcome.long_ema,
                block.outcome.min_gas_price.to_string()
            );
        }

        info!(blocks = blocks.len(), "Simulation finished");
        Ok(())
    }

    fn run_genesis(config: FeeModelConfig, denom: Option<String>) -> Result<()> {
        let mut config = config;
        if let Some(denom) = denom {
            config.module.fee_denom = denom;
        }
        let genesis = config.genesis();
        genesis.validate()?;
        println!("{}", genesis.to_json()?);
        Ok(())
    }

    fn run_validate_genesis(file: &Path) -> Result<()> {
        let contents = fs::read_to_string(file)
            .with_context(|| format!("Failed to read genesis from {}", file.display()))?;
        let genesis = GenesisState::from_json(&contents)?;
        genesis
            .validate()
            .with_context(|| format!("Invalid genesis in {}", file.display()))?;
        println!("Genesis is valid: min gas price {}", genesis.min_gas_price);
        Ok(())
    }

    fn run_recommend(config: &FeeModelConfig, after: u32) -> Result<()> {
        let mut sim = Simulator::new(config)?;
        sim.run(config)?;

        let response = Querier::new(sim.keeper())
            .recommended_gas_price(QueryRecommendedGasPriceRequest { after_blocks: after })?;

        println!("Recommended gas price after {} blocks (height {})", after, sim.height());
        println!("  low:  {}", response.low);
        println!("  med:  {}", response.med);
        println!("  high: {}", response.high);
        Ok(())
    }
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    use clap::Parser;
    use tracing_subscriber::EnvFilter;

    let cli = cli::Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    cli::run(cli)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("This binary requires the 'cli' feature. Build with:");
    eprintln!("  cargo build -p coreum-feemodel --features cli --bin feemodel-sim");
}
