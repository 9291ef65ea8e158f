// Copyright 2024 the Sonntagsfrage developers.
// This file is part of Sonntagsfrage.
// Sonntagsfrage is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// Sonntagsfrage is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with Sonntagsfrage.  If not, see <https://www.gnu.org/licenses/>.


//! Scrape every pollster's results page and merge the fresh records into the
//! per-pollster store files. Each pollster is one unit of work: a failure is
//! logged and does not stop the rest of the batch.

use std::path::PathBuf;
use clap::Parser;
use log::{error, info};
use survey::download::{fetch_document, CacheDir};
use survey::store;
use wahlrecht::{Pollster, POLLSTERS};

#[derive(Parser)]
#[command(version, author, name="scrape-surveys")]
/// Extract the current survey data from all wahlrecht.de pollster pages and
/// merge it into the per-pollster store files.
struct Opts {
    /// The directory the store files live in, one file per pollster.
    #[arg(long,default_value="data")]
    out_dir : PathBuf,

    /// Only scrape the named pollsters. If not given, all are scraped.
    #[arg(long)]
    pollster : Vec<String>,

    /// Keep a local mirror of fetched pages under this directory and reuse it.
    /// Intended for development; a real run should always fetch.
    #[arg(long)]
    cache : Option<PathBuf>,
}

fn scrape_one(pollster:&Pollster,opts:&Opts) -> anyhow::Result<()> {
    info!("Extracting data from {}...",pollster.name);
    let raw = match &opts.cache {
        Some(dir) => CacheDir::new(dir).get_or_fetch(pollster.url)?,
        None => fetch_document(pollster.url)?,
    };
    let incoming = wahlrecht::parse_page(&raw)?;
    let path = opts.out_dir.join(pollster.file);
    let mut history = store::load_history_or_empty(&path)?;
    history.merge(incoming);
    store::write_history(&path,&history)?;
    info!("{}: {} records stored",pollster.name,history.len());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts : Opts = Opts::parse();
    let mut failures = 0;
    for pollster in POLLSTERS {
        if !opts.pollster.is_empty() && !opts.pollster.iter().any(|name|name==pollster.name) { continue; }
        if let Err(e) = scrape_one(pollster,&opts) {
            error!("An error occurred for {}: {:#}",pollster.name,e);
            failures+=1;
        }
    }
    if failures>0 { anyhow::bail!("{} pollster run(s) failed",failures); }
    Ok(())
}
