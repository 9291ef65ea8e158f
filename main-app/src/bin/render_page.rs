// Copyright 2024 the Sonntagsfrage developers.
// This file is part of Sonntagsfrage.
// Sonntagsfrage is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// Sonntagsfrage is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with Sonntagsfrage.  If not, see <https://www.gnu.org/licenses/>.


//! Render the party spread store as the static HTML page for publication.

use std::path::PathBuf;
use chrono::Local;
use clap::Parser;
use main_app::page;
use survey::spread;

#[derive(Parser)]
#[command(version, author, name="render-page")]
/// Transform the party spread store into the static HTML chart page.
struct Opts {
    /// The party spread store file to read.
    #[arg(long,default_value="data/sonntagsfrage.txt")]
    store : PathBuf,

    /// Where to write the HTML page.
    #[arg(long,default_value="docs/index.html")]
    out : PathBuf,

    /// How many of the most recent poll dates to chart.
    #[arg(long,default_value_t=10)]
    data_points : usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts : Opts = Opts::parse();
    let spread = spread::load_spread_or_empty(&opts.store)?;
    let generated = Local::now().format("%d.%m.%Y %H:%M:%S").to_string();
    let html = page::render(&spread,opts.data_points,&generated);
    if let Some(parent) = opts.out.parent() {
        if !parent.as_os_str().is_empty() { std::fs::create_dir_all(parent)?; }
    }
    std::fs::write(&opts.out,html)?;
    Ok(())
}
