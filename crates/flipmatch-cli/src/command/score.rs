use std::path::PathBuf;

use anyhow::ensure;
use flipmatch_engine::{ScoreInput, combo_segments};
use serde::Serialize;

use crate::{command::ConfigArg, util};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ScoreArg {
    /// Level id in the standard catalog
    #[arg(long)]
    level: u32,
    /// Attempt outcomes in order, `t` for a match and `f` for a miss (e.g. `tfft`)
    #[arg(long, value_parser = parse_history, default_value = "")]
    history: History,
    /// Number of attempts (defaults to the history length)
    #[arg(long)]
    attempts: Option<usize>,
    /// Matched pairs (defaults to the number of `t` in the history)
    #[arg(long)]
    successful_pairs: Option<usize>,
    /// Playing time in seconds
    #[arg(long, default_value_t = 0.0)]
    elapsed: f64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    #[clap(flatten)]
    config: ConfigArg,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
struct History(Vec<bool>);

fn parse_history(s: &str) -> Result<History, String> {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| match c {
            't' | 'T' | '1' => Ok(true),
            'f' | 'F' | '0' => Ok(false),
            _ => Err(format!("invalid attempt outcome {c:?}: expected `t` or `f`")),
        })
        .collect::<Result<_, _>>()
        .map(History)
}

#[derive(Debug, Serialize)]
struct ScoreReport {
    level_id: u32,
    total_pairs: usize,
    attempts: usize,
    successful_pairs: usize,
    combo_segments: Vec<u32>,
    elapsed_secs: f64,
    #[serde(flatten)]
    score: flipmatch_engine::ScoreBreakdown,
}

pub(crate) fn run(arg: &ScoreArg) -> anyhow::Result<()> {
    let ScoreArg {
        level,
        history: History(history),
        attempts,
        successful_pairs,
        elapsed,
        output,
        config,
    } = arg;

    let level = util::standard_level(*level)?;
    let scoring = config.scoring()?;
    let attempts = attempts.unwrap_or(history.len());
    let successful_pairs =
        successful_pairs.unwrap_or_else(|| history.iter().filter(|hit| **hit).count());

    ensure!(
        elapsed.is_finite() && *elapsed >= 0.0,
        "elapsed time must be a non-negative number of seconds, got {elapsed}"
    );
    ensure!(
        successful_pairs <= level.total_pairs(),
        "level {} has only {} pairs, got {successful_pairs} successful pairs",
        level.id(),
        level.total_pairs()
    );
    if attempts < history.len() {
        log::warn!(
            "{attempts} attempts is fewer than the {} recorded outcomes",
            history.len()
        );
    }

    let score = scoring.score(&ScoreInput {
        total_pairs: level.total_pairs(),
        successful_pairs,
        attempts,
        match_history: history,
        elapsed_secs: *elapsed,
    });
    let report = ScoreReport {
        level_id: level.id(),
        total_pairs: level.total_pairs(),
        attempts,
        successful_pairs,
        combo_segments: combo_segments(history),
        elapsed_secs: *elapsed,
        score,
    };
    util::write_json(&report, output.as_deref())
}
