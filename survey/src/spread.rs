// Copyright 2024 the Sonntagsfrage developers.
// This file is part of Sonntagsfrage.
// Sonntagsfrage is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// Sonntagsfrage is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with Sonntagsfrage.  If not, see <https://www.gnu.org/licenses/>.


//! The cross-pollster view: for each party and publication date, the lowest
//! and highest percentage any pollster reported. This is the input of the
//! rendered chart page, and uses the same store line primitive as the
//! per-pollster history (one block per date, `key: value` lines).

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use crate::fields::Party;
use crate::history::PollsterHistory;
use crate::record::{format_percentage, format_publication_date, parse_publication_date};
use crate::store::{write_atomically, StoreError};

/// Per party and date, the (min, max) percentage observed across pollsters.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct PartySpread {
    per_party : BTreeMap<Party,BTreeMap<NaiveDate,(f64,f64)>>,
}

impl PartySpread {
    pub fn new() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.per_party.is_empty() }

    pub fn parties(&self) -> impl Iterator<Item=Party> + '_ { self.per_party.keys().copied() }

    pub fn get(&self,party:Party,date:NaiveDate) -> Option<(f64,f64)> {
        self.per_party.get(&party).and_then(|dates|dates.get(&date)).copied()
    }

    /// Record one pollster's value for a party on a date, widening the spread.
    pub fn observe(&mut self,party:Party,date:NaiveDate,value:f64) {
        let entry = self.per_party.entry(party).or_default().entry(date).or_insert((value,value));
        if value<entry.0 { entry.0=value; }
        if value>entry.1 { entry.1=value; }
    }

    /// Fold one pollster's full history in.
    pub fn add_history(&mut self,history:&PollsterHistory) {
        for record in history.iter_newest_first() {
            for (&party,&value) in &record.parties {
                self.observe(party,record.publication_date,value);
            }
        }
    }

    /// Take over a freshly combined spread. Each (party, date) entry of the
    /// incoming spread replaces the stored one wholesale; entries the incoming
    /// spread does not cover are kept.
    pub fn merge(&mut self,incoming:PartySpread) {
        for (party,dates) in incoming.per_party {
            let existing = self.per_party.entry(party).or_default();
            for (date,range) in dates {
                existing.insert(date,range);
            }
        }
    }

    /// All publication dates any party has an entry for, newest first.
    pub fn dates_newest_first(&self) -> Vec<NaiveDate> {
        let mut dates : BTreeSet<NaiveDate> = BTreeSet::new();
        for per_date in self.per_party.values() { dates.extend(per_date.keys().copied()); }
        dates.into_iter().rev().collect()
    }

    /// The most recent (date, min, max) entry for a party.
    pub fn latest(&self,party:Party) -> Option<(NaiveDate,f64,f64)> {
        self.per_party.get(&party)
            .and_then(|dates|dates.iter().next_back())
            .map(|(&date,&(min,max))|(date,min,max))
    }
}

/// Serialize, one block per date newest first, `party-key: [min, max]` lines.
pub fn encode(spread:&PartySpread) -> String {
    let mut out = String::new();
    for date in spread.dates_newest_first() {
        out.push_str(&format!("dat: {}\n",format_publication_date(date)));
        for party in spread.parties().collect::<Vec<_>>() {
            if let Some((min,max)) = spread.get(party,date) {
                out.push_str(&format!("{}: [{}, {}]\n",party.store_key(),format_percentage(min),format_percentage(max)));
            }
        }
        out.push('\n');
    }
    out
}

pub fn decode(text:&str) -> Result<PartySpread,StoreError> {
    let mut spread = PartySpread::new();
    let mut date : Option<NaiveDate> = None;
    for (index,line) in text.lines().enumerate() {
        let line_number = index+1;
        if line.trim().is_empty() { date=None; continue; }
        let (key,value) = line.split_once(':').ok_or(StoreError::MalformedLine(line_number))?;
        let (key,value) = (key.trim(),value.trim());
        let bad = ||StoreError::BadValue{key:key.to_string(),value:value.to_string()};
        if key=="dat" {
            date = Some(parse_publication_date(value).ok_or_else(bad)?);
            continue;
        }
        let date = date.ok_or(StoreError::MissingDate(line_number))?;
        match Party::from_store_key(key) {
            None => { warn!("ignoring unrecognized store key {:?} on line {}",key,line_number); }
            Some(party) => {
                let inner = value.strip_prefix('[').and_then(|v|v.strip_suffix(']')).ok_or_else(bad)?;
                let (min,max) = inner.split_once(',').ok_or_else(bad)?;
                let min : f64 = min.trim().parse().map_err(|_|bad())?;
                let max : f64 = max.trim().parse().map_err(|_|bad())?;
                spread.per_party.entry(party).or_default().insert(date,(min,max));
            }
        }
    }
    Ok(spread)
}

pub fn load_spread_or_empty<P:AsRef<Path>>(path:P) -> Result<PartySpread,StoreError> {
    match std::fs::read_to_string(path) {
        Ok(text) => decode(&text),
        Err(e) if e.kind()==std::io::ErrorKind::NotFound => Ok(PartySpread::new()),
        Err(e) => Err(e.into()),
    }
}

pub fn write_spread<P:AsRef<Path>>(path:P,spread:&PartySpread) -> Result<(),StoreError> {
    write_atomically(path.as_ref(),&encode(spread))
}
