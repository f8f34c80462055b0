use std::path::PathBuf;

use flipmatch_engine::{Progress, ProgressStore as _};

use crate::{schema::progress_file::ProgressFile, util};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ProgressArg {
    /// Progress file to print
    #[arg(long)]
    progress: PathBuf,
    /// Reset the file to fresh progress before printing
    #[arg(long)]
    reset: bool,
    /// Forget the best score and best time of one level before printing
    #[arg(long, value_name = "LEVEL", conflicts_with = "reset")]
    reset_level: Option<u32>,
}

pub(crate) fn run(arg: &ProgressArg) -> anyhow::Result<()> {
    if arg.reset {
        ProgressFile::save(Progress::default(), &arg.progress)?;
    }
    if let Some(level_id) = arg.reset_level {
        let file = ProgressFile::open(&arg.progress)?;
        ProgressFile::save(reset_level(file, level_id)?, &arg.progress)?;
    }
    let file = ProgressFile::open(&arg.progress)?;
    log::debug!("{} saved at {}", arg.progress.display(), file.saved_at);
    util::write_json(&file, None)
}

fn reset_level(file: ProgressFile, level_id: u32) -> anyhow::Result<Progress> {
    let level = util::standard_level(level_id)?;
    let mut store = file.into_store();
    if store.reset_level_best(level.id()) {
        log::info!("best score of level {level_id} reset");
    } else {
        log::warn!("level {level_id} has no best score to reset");
    }
    Ok(store.into_progress())
}

#[cfg(test)]
mod tests {
    use flipmatch_engine::{MemoryProgressStore, ProgressStore as _, ScoreBreakdown};

    use super::*;

    #[test]
    fn test_reset_level_keeps_other_levels() {
        let mut store = MemoryProgressStore::default();
        for (level_id, total) in [(1, 40), (2, 55)] {
            let score = ScoreBreakdown {
                total,
                ..ScoreBreakdown::default()
            };
            store.commit_session_result(level_id, &score, 10);
        }
        let file = ProgressFile::new(store.into_progress());

        let progress = reset_level(file.clone(), 2).unwrap();
        assert_eq!(progress.best_score_per_level.len(), 1);
        assert_eq!(progress.best_score_per_level[&1], 40);
        assert_eq!(progress.max_unlocked_level, 3);

        assert!(reset_level(file, 99).is_err());
    }
}
