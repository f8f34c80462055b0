use std::path::PathBuf;

use flipmatch_engine::{LevelCatalog, LevelConfig, Tier};
use serde::Serialize;

use crate::{command::ConfigArg, util};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct LevelsArg {
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
    /// Output file path (JSON only)
    #[arg(long, requires = "json")]
    output: Option<PathBuf>,
    #[clap(flatten)]
    config: ConfigArg,
}

#[derive(Debug, Clone, Serialize)]
struct LevelRow {
    #[serde(flatten)]
    level: LevelConfig,
    total_pairs: usize,
    preview_secs: f64,
}

pub(crate) fn run(arg: &LevelsArg) -> anyhow::Result<()> {
    let scoring = arg.config.scoring()?;
    let rows = LevelCatalog::standard()
        .iter()
        .map(|level| LevelRow {
            level: *level,
            total_pairs: level.total_pairs(),
            preview_secs: scoring.preview_duration_secs(level.card_count()),
        })
        .collect::<Vec<_>>();

    if arg.json {
        return util::write_json(&rows, arg.output.as_deref());
    }

    println!(
        "{:>5}  {:>5}  {:>7}  {:<9}  {:>7}",
        "level", "cards", "grid", "tier", "preview"
    );
    let mut tier = None::<Tier>;
    for row in &rows {
        let level = &row.level;
        if tier.is_some_and(|tier| tier != level.tier()) {
            println!();
        }
        tier = Some(level.tier());
        println!(
            "{:>5}  {:>5}  {:>7}  {:<9}  {:>6.1}s",
            level.id(),
            level.card_count(),
            format!("{}x{}", level.rows(), level.cols()),
            level.tier().to_string(),
            row.preview_secs
        );
    }
    Ok(())
}
