use std::path::PathBuf;

use flipmatch_engine::{PowerupController, PowerupKind};
use serde::Serialize;

use crate::{
    command::{ConfigArg, simulate::PowerupArg},
    schema::progress_file::ProgressFile,
    util,
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ShopArg {
    /// Progress file holding the currency to spend
    #[arg(long)]
    progress: PathBuf,
    /// Power-up to buy (bomb, glimpse or skip)
    #[arg(long)]
    buy: Option<PowerupArg>,
    /// How many to buy
    #[arg(long, default_value_t = 1)]
    count: u32,
    #[clap(flatten)]
    config: ConfigArg,
}

#[derive(Debug, Serialize)]
struct ShopListing {
    kind: PowerupKind,
    price: u32,
    owned: u32,
}

#[derive(Debug, Serialize)]
struct ShopReport {
    currency: u32,
    items: Vec<ShopListing>,
}

pub(crate) fn run(arg: &ShopArg) -> anyhow::Result<()> {
    let controller = PowerupController::new(arg.config.prices()?);
    let mut store = ProgressFile::open_or_default(&arg.progress)?.into_store();

    if let Some(kind) = arg.buy.map(PowerupKind::from) {
        controller.purchase(&mut store, kind, arg.count)?;
        ProgressFile::save(store.get().clone(), &arg.progress)?;
    }

    let progress = store.get();
    let report = ShopReport {
        currency: progress.currency,
        items: PowerupKind::ALL
            .into_iter()
            .map(|kind| ShopListing {
                kind,
                price: controller.prices().price(kind),
                owned: progress.powerup_inventory.count(kind),
            })
            .collect(),
    };
    util::write_json(&report, None)
}
