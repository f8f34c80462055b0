use std::{path::PathBuf, str::FromStr};

use anyhow::{Context as _, bail, ensure};
use flipmatch_engine::{
    BoardSeed, LevelCatalog, LevelConfig, LevelSession, MemoryProgressStore, PowerupController,
    PowerupKind, Progress, SessionOptions,
};
use rand::SeedableRng as _;
use rand_pcg::Pcg32;

use crate::{
    command::ConfigArg,
    model::player::SimulatedPlayer,
    schema::{
        progress_file::ProgressFile,
        simulation::{PowerupRecord, SimulationReport},
    },
    util,
};

/// Safety net against a player that never clears the board.
const MAX_ATTEMPTS: usize = 100_000;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Level id in the standard catalog
    #[arg(long)]
    level: u32,
    /// Board seed as 32 hex digits (random if omitted)
    #[arg(long)]
    seed: Option<BoardSeed>,
    /// Seed for the simulated player's choices (random if omitted)
    #[arg(long)]
    player_seed: Option<u64>,
    /// Probability that the player remembers a card it has seen
    #[arg(long, default_value_t = 0.7)]
    recall: f64,
    /// Progress file to spend from and commit the result to
    #[arg(long)]
    progress: Option<PathBuf>,
    /// Play a level that is still locked in the progress file, without saving the result
    #[arg(long)]
    force: bool,
    /// Power-up to request once the given number of attempts is reached (e.g. `bomb@3`)
    #[arg(long = "powerup")]
    powerups: Vec<PowerupPlan>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    #[clap(flatten)]
    config: ConfigArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub(crate) enum PowerupArg {
    Bomb,
    Glimpse,
    Clock,
    Skip,
}

impl From<PowerupArg> for PowerupKind {
    fn from(arg: PowerupArg) -> Self {
        match arg {
            PowerupArg::Bomb => PowerupKind::Bomb,
            PowerupArg::Glimpse | PowerupArg::Clock => PowerupKind::Glimpse,
            PowerupArg::Skip => PowerupKind::Skip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display("{kind}@{at_attempt}")]
struct PowerupPlan {
    kind: PowerupKind,
    at_attempt: usize,
}

impl FromStr for PowerupPlan {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, at_attempt) = s.split_once('@').unwrap_or((s, "0"));
        let kind = kind
            .trim()
            .parse::<PowerupArg>()
            .map_err(|_| anyhow::anyhow!("unknown power-up {kind:?}"))?;
        let at_attempt = at_attempt
            .trim()
            .parse()
            .with_context(|| format!("invalid attempt number in {s:?}"))?;
        Ok(Self {
            kind: kind.into(),
            at_attempt,
        })
    }
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let level = util::standard_level(arg.level)?;
    let mut store = match &arg.progress {
        Some(path) => ProgressFile::open_or_default(path)?.into_store(),
        // Nothing is saved, so every level is playable.
        None => MemoryProgressStore::from_progress(
            Progress {
                max_unlocked_level: LevelCatalog::STANDARD_LEN,
                ..Progress::default()
            },
            LevelCatalog::STANDARD_LEN,
        ),
    };

    let report = simulate(arg, &level, &mut store)?;

    if let Some(path) = &arg.progress {
        ProgressFile::save(store.into_progress(), path)?;
    }
    util::write_json(&report, arg.output.as_deref())
}

/// Plays `level` against `store`.
///
/// A level beyond the store's unlock frontier is refused unless `force` is
/// set, in which case it is played against a copy of the store so that
/// neither the frontier nor the balance changes.
fn simulate(
    arg: &SimulateArg,
    level: &LevelConfig,
    store: &mut MemoryProgressStore,
) -> anyhow::Result<SimulationReport> {
    let unlocked = store.get().max_unlocked_level;
    if level.id() <= unlocked {
        return play(arg, level, store);
    }
    ensure!(
        arg.force,
        "level {} is locked (max unlocked: {unlocked}); pass --force to play it without saving",
        level.id()
    );
    log::warn!(
        "level {} is locked (max unlocked: {unlocked}); the result will not be saved",
        level.id()
    );
    play(arg, level, &mut store.clone())
}

fn play(
    arg: &SimulateArg,
    level: &LevelConfig,
    store: &mut MemoryProgressStore,
) -> anyhow::Result<SimulationReport> {
    let SimulateArg {
        seed,
        player_seed,
        recall,
        powerups,
        config,
        ..
    } = arg;

    ensure!(
        (0.0..=1.0).contains(recall),
        "recall must be between 0 and 1, got {recall}"
    );
    let options = SessionOptions {
        scoring: config.scoring()?,
        seed: *seed,
        ..SessionOptions::default()
    };
    let controller = PowerupController::new(config.prices()?);

    let mut plans = powerups.clone();
    plans.sort_by_key(|plan| plan.at_attempt);
    plans.reverse();

    let rng = player_seed.map_or_else(|| Pcg32::from_rng(&mut rand::rng()), Pcg32::seed_from_u64);
    let mut player = SimulatedPlayer::new(*recall, rng);
    let mut session = LevelSession::with_options(level, store, options)?;
    let mut records = vec![];

    log::info!(
        "simulating level {} with seed {} and recall {recall}",
        level.id(),
        session.board().seed()
    );

    player.observe(&session);
    session.advance(session.preview_remaining());

    while session.phase().is_playing() {
        while let Some(&plan) = plans
            .last()
            .filter(|plan| plan.at_attempt <= session.attempts())
        {
            plans.pop();
            let result = controller.request(&mut session, plan.kind);
            if let Err(rejection) = &result {
                log::warn!("power-up {plan} rejected: {rejection}");
            }
            records.push(PowerupRecord {
                kind: plan.kind,
                at_attempt: session.attempts(),
                outcome: result.as_ref().ok().map(|receipt| receipt.outcome),
                rejection: result.err().map(|rejection| rejection.to_string()),
            });
            player.observe(&session);
        }
        if !session.phase().is_playing() {
            break;
        }
        if session.is_glimpse_active() || session.is_awaiting_resolution() {
            session.tick();
            continue;
        }
        if session.attempts() >= MAX_ATTEMPTS {
            bail!("player gave up after {MAX_ATTEMPTS} attempts");
        }

        let first = player
            .pick_first(&session)
            .context("no face-down card left to pick")?;
        session.tap_card(first)?;
        player.observe(&session);

        let second = player
            .pick_second(&session, first)
            .context("no face-down card left to pick")?;
        session.tap_card(second)?;
        player.observe(&session);

        session.tick();
    }
    for plan in plans.iter().rev() {
        log::warn!("power-up {plan} was never requested: the level ended first");
    }

    Ok(SimulationReport {
        recall: *recall,
        telemetry: session.telemetry(),
        score: session.score().copied(),
        powerups: records,
        currency: session.store().get().currency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_powerup_plan() {
        let plan: PowerupPlan = "bomb@3".parse().unwrap();
        assert_eq!(
            plan,
            PowerupPlan {
                kind: PowerupKind::Bomb,
                at_attempt: 3
            }
        );
        assert_eq!(plan.to_string(), "bomb@3");

        let plan: PowerupPlan = "Clock".parse().unwrap();
        assert_eq!(plan.kind, PowerupKind::Glimpse);
        assert_eq!(plan.at_attempt, 0);

        assert!("laser@1".parse::<PowerupPlan>().is_err());
        assert!("skip@soon".parse::<PowerupPlan>().is_err());
    }

    fn perfect_player(level: u32, force: bool) -> SimulateArg {
        SimulateArg {
            level,
            player_seed: Some(7),
            recall: 1.0,
            force,
            ..SimulateArg::default()
        }
    }

    #[test]
    fn test_locked_level_is_refused() {
        let level = util::standard_level(3).unwrap();
        let mut store = MemoryProgressStore::default();
        let err = simulate(&perfect_player(3, false), &level, &mut store).unwrap_err();
        assert!(err.to_string().contains("locked"));
        assert_eq!(store, MemoryProgressStore::default());
    }

    #[test]
    fn test_forced_locked_level_does_not_move_frontier() {
        let level = util::standard_level(3).unwrap();
        let mut store = MemoryProgressStore::default();
        let report = simulate(&perfect_player(3, true), &level, &mut store).unwrap();
        assert!(report.score.is_some());
        assert!(report.currency > 0);
        assert_eq!(store.get().max_unlocked_level, 1);
        assert_eq!(store.get().currency, 0);
        assert!(store.get().best_score_per_level.is_empty());
    }

    #[test]
    fn test_unlocked_level_commits_result() {
        let level = util::standard_level(1).unwrap();
        let mut store = MemoryProgressStore::default();
        let report = simulate(&perfect_player(1, false), &level, &mut store).unwrap();
        assert_eq!(store.get().max_unlocked_level, 2);
        assert_eq!(store.get().currency, report.currency);
        assert!(store.get().best_score_per_level.contains_key(&1));
    }
}
