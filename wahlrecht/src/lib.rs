// Copyright 2024 the Sonntagsfrage developers.
// This file is part of Sonntagsfrage.
// Sonntagsfrage is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// Sonntagsfrage is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with Sonntagsfrage.  If not, see <https://www.gnu.org/licenses/>.


//! Scraping the per-pollster Sonntagsfrage pages on wahlrecht.de. All the
//! pages share one family of table layouts (one table per pollster, columns
//! varying per pollster); this crate knows the layout quirks and the fixed
//! list of pollsters.

pub mod parse_table;
mod test_parse;

use scraper::Html;
use survey::download::fetch_document;
use survey::history::PollsterHistory;

/// One polling organization whose results page is scraped independently.
pub struct Pollster {
    pub name : &'static str,
    pub url : &'static str,
    /// File name of the pollster's store, relative to the data directory.
    pub file : &'static str,
}

/// The pollsters published on wahlrecht.de. Fixed; the site has one page each.
pub const POLLSTERS : &[Pollster] = &[
    Pollster{ name: "Allensbach", url: "https://www.wahlrecht.de/umfragen/allensbach.htm", file: "Allensbach.txt" },
    Pollster{ name: "Verian (Emnid)", url: "https://www.wahlrecht.de/umfragen/emnid.htm", file: "Verian (Emnid).txt" },
    Pollster{ name: "Forsa", url: "https://www.wahlrecht.de/umfragen/forsa.htm", file: "Forsa.txt" },
    Pollster{ name: "Forschungsgruppe Wahlen", url: "https://www.wahlrecht.de/umfragen/politbarometer.htm", file: "Forschungsgruppe Wahlen.txt" },
    Pollster{ name: "GMS", url: "https://www.wahlrecht.de/umfragen/gms.htm", file: "GMS.txt" },
    Pollster{ name: "Infratest dimap", url: "https://www.wahlrecht.de/umfragen/dimap.htm", file: "Infratest dimap.txt" },
    Pollster{ name: "INSA", url: "https://www.wahlrecht.de/umfragen/insa.htm", file: "INSA.txt" },
    Pollster{ name: "YouGov", url: "https://www.wahlrecht.de/umfragen/yougov.htm", file: "YouGov.txt" },
];

/// Decode an already-fetched page.
pub fn parse_page(raw:&str) -> Result<PollsterHistory,parse_table::StructureError> {
    let document = Html::parse_document(raw);
    parse_table::parse_survey_table(&document)
}

/// Fetch and decode one pollster's page.
pub fn scrape_pollster(url:&str) -> anyhow::Result<PollsterHistory> {
    let raw = fetch_document(url)?;
    Ok(parse_page(&raw)?)
}
