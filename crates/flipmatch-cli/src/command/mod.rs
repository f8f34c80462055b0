use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flipmatch_engine::{PowerupPrices, ScoringConfig};

use crate::util;

use self::{
    levels::LevelsArg, progress::ProgressArg, score::ScoreArg, shop::ShopArg,
    simulate::SimulateArg,
};

mod levels;
mod progress;
mod score;
mod shop;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Print the level catalog
    Levels(#[clap(flatten)] LevelsArg),
    /// Compute a score breakdown from raw session telemetry
    Score(#[clap(flatten)] ScoreArg),
    /// Auto-play one level with a simulated player
    Simulate(#[clap(flatten)] SimulateArg),
    /// Buy power-ups with saved currency
    Shop(#[clap(flatten)] ShopArg),
    /// Print a progress file
    Progress(#[clap(flatten)] ProgressArg),
}

/// Tuning files shared by the commands that score or sell things.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ConfigArg {
    /// Scoring configuration (JSON); missing fields use defaults
    #[arg(long)]
    scoring_config: Option<PathBuf>,
    /// Power-up prices (JSON); missing fields use defaults
    #[arg(long)]
    prices: Option<PathBuf>,
}

impl ConfigArg {
    pub(crate) fn scoring(&self) -> anyhow::Result<ScoringConfig> {
        let Some(path) = &self.scoring_config else {
            return Ok(ScoringConfig::default());
        };
        let config: ScoringConfig = util::read_json_file("scoring config", path)?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn prices(&self) -> anyhow::Result<PowerupPrices> {
        self.prices
            .as_ref()
            .map_or(Ok(PowerupPrices::default()), |path| {
                util::read_json_file("prices", path)
            })
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Levels(arg) => levels::run(&arg)?,
        Mode::Score(arg) => score::run(&arg)?,
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::Shop(arg) => shop::run(&arg)?,
        Mode::Progress(arg) => progress::run(&arg)?,
    }
    Ok(())
}
