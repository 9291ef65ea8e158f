// Copyright 2024 the Sonntagsfrage developers.
// This file is part of Sonntagsfrage.
// Sonntagsfrage is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// Sonntagsfrage is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with Sonntagsfrage.  If not, see <https://www.gnu.org/licenses/>.


//! Fold all per-pollster stores into the cross-pollster party spread store.
//! Run this only after the scrape runs of interest have finished; it reads
//! whatever per-pollster stores are durably on disk.

use std::path::PathBuf;
use clap::Parser;
use log::info;
use survey::spread::{self, PartySpread};
use survey::store;
use wahlrecht::POLLSTERS;

#[derive(Parser)]
#[command(version, author, name="combine-surveys")]
/// Combine the per-pollster store files into the party spread store the chart
/// page is rendered from.
struct Opts {
    /// The directory the per-pollster store files live in.
    #[arg(long,default_value="data")]
    out_dir : PathBuf,

    /// The party spread store file to update.
    #[arg(long,default_value="data/sonntagsfrage.txt")]
    out : PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts : Opts = Opts::parse();
    let mut fresh = PartySpread::new();
    for pollster in POLLSTERS {
        let path = opts.out_dir.join(pollster.file);
        if !path.exists() {
            info!("no store yet for {}, skipping",pollster.name);
            continue;
        }
        let history = store::load_history(&path)?;
        info!("{}: {} records",pollster.name,history.len());
        fresh.add_history(&history);
    }
    let mut combined = spread::load_spread_or_empty(&opts.out)?;
    combined.merge(fresh);
    spread::write_spread(&opts.out,&combined)?;
    Ok(())
}
