// Copyright 2024 the Sonntagsfrage developers.
// This file is part of Sonntagsfrage.
// Sonntagsfrage is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// Sonntagsfrage is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with Sonntagsfrage.  If not, see <https://www.gnu.org/licenses/>.


//! The full history of one pollster: a date-keyed collection of survey
//! records, and the merge of a freshly scraped batch into it.

use std::collections::BTreeMap;
use std::fmt::Display;
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use crate::record::{format_percentage, format_publication_date, SurveyRecord};

/// All survey records of one pollster, keyed by publication date, each date at
/// most once. Iteration for persistence and display is newest first.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct PollsterHistory {
    records : BTreeMap<NaiveDate,SurveyRecord>,
}

impl PollsterHistory {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.records.len() }
    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn get(&self,date:&NaiveDate) -> Option<&SurveyRecord> { self.records.get(date) }

    /// Insert a record under its publication date, returning the record it
    /// displaced if the date was already present.
    pub fn insert(&mut self,record:SurveyRecord) -> Option<SurveyRecord> {
        self.records.insert(record.publication_date,record)
    }

    /// Records, newest publication date first.
    pub fn iter_newest_first(&self) -> impl Iterator<Item=&SurveyRecord> {
        self.records.values().rev()
    }

    /// Publication dates present, newest first.
    pub fn dates_newest_first(&self) -> impl Iterator<Item=NaiveDate> + '_ {
        self.records.keys().rev().copied()
    }

    /// Merge a freshly scraped batch into this history. A new date is inserted
    /// wholesale. For a date already present, fields are merged one by one:
    /// a field absent here takes the incoming value; a field present with a
    /// differing incoming value is a conflict, logged with date, field and both
    /// values, and the incoming value wins. A field the incoming batch does not
    /// supply is left untouched, so values that scroll off the source page are
    /// never lost. Merging a history with itself changes nothing and logs
    /// nothing.
    pub fn merge(&mut self,incoming:PollsterHistory) {
        for (date,record) in incoming.records {
            match self.records.get_mut(&date) {
                None => { self.records.insert(date,record); }
                Some(existing) => {
                    merge_field(&mut existing.collection_period,record.collection_period,date,"dat2");
                    merge_field(&mut existing.surveyed_count,record.surveyed_count,date,"befr");
                    if let Some(value) = record.non_voters {
                        match existing.non_voters {
                            None => { existing.non_voters=Some(value); }
                            Some(old) if old!=value => {
                                warn!("data conflict for {} (non): {} vs {}",format_publication_date(date),format_percentage(old),format_percentage(value));
                                existing.non_voters=Some(value);
                            }
                            Some(_) => {}
                        }
                    }
                    for (party,value) in record.parties {
                        match existing.parties.get(&party).copied() {
                            None => { existing.parties.insert(party,value); }
                            Some(old) if old!=value => {
                                warn!("data conflict for {} ({}): {} vs {}",format_publication_date(date),party.store_key(),format_percentage(old),format_percentage(value));
                                existing.parties.insert(party,value);
                            }
                            Some(_) => {}
                        }
                    }
                }
            }
        }
    }
}

/// Field-level merge: fill an absent value, keep an equal one, and overwrite a
/// differing one with a logged conflict.
fn merge_field<T:PartialEq+Display>(existing:&mut Option<T>,incoming:Option<T>,date:NaiveDate,field:&str) {
    if let Some(value) = incoming {
        match existing {
            None => { *existing=Some(value); }
            Some(old) if *old!=value => {
                warn!("data conflict for {} ({}): {} vs {}",format_publication_date(date),field,old,value);
                *existing=Some(value);
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crate::fields::Party;
    use crate::history::PollsterHistory;
    use crate::record::{SampleSize, SurveyMethod, SurveyRecord};

    fn date(s:&str) -> NaiveDate { crate::record::parse_publication_date(s).unwrap() }

    fn record(date_text:&str,cdu:f64,spd:f64) -> SurveyRecord {
        let mut record = SurveyRecord::new(date(date_text));
        record.parties.insert(Party::CduCsu,cdu);
        record.parties.insert(Party::Spd,spd);
        record
    }

    #[test]
    fn merge_inserts_new_dates() {
        let mut existing = PollsterHistory::new();
        existing.insert(record("01.01.2024",30.0,20.0));
        let mut incoming = PollsterHistory::new();
        incoming.insert(record("08.01.2024",31.0,19.0));
        existing.merge(incoming);
        assert_eq!(2,existing.len());
        assert_eq!(vec![date("08.01.2024"),date("01.01.2024")],existing.dates_newest_first().collect::<Vec<_>>());
    }

    #[test]
    fn merge_is_idempotent() {
        let mut history = PollsterHistory::new();
        let mut r = record("01.01.2024",30.0,20.0);
        r.surveyed_count = Some(SampleSize{count:1234,method:SurveyMethod::Telephone});
        history.insert(r);
        history.insert(record("08.01.2024",31.0,19.0));
        let before = history.clone();
        history.merge(before.clone());
        assert_eq!(before,history);
    }

    #[test]
    fn merge_keeps_fields_not_rescraped() {
        let mut existing = PollsterHistory::new();
        let mut old = record("01.01.2024",30.0,20.0);
        old.surveyed_count = Some(SampleSize{count:1234,method:SurveyMethod::Online});
        old.parties.insert(Party::Fdp,5.0);
        existing.insert(old);
        // later scrape no longer shows FDP or the sample size for that date
        let mut incoming = PollsterHistory::new();
        incoming.insert(record("01.01.2024",30.0,20.0));
        existing.merge(incoming);
        let merged = existing.get(&date("01.01.2024")).unwrap();
        assert_eq!(Some(5.0),merged.parties.get(&Party::Fdp).copied());
        assert_eq!(Some(SampleSize{count:1234,method:SurveyMethod::Online}),merged.surveyed_count);
    }

    #[test]
    fn merge_overwrites_on_conflict() {
        let mut existing = PollsterHistory::new();
        existing.insert(record("01.01.2024",30.0,20.0));
        let mut incoming = PollsterHistory::new();
        incoming.insert(record("01.01.2024",30.5,20.0));
        existing.merge(incoming);
        let merged = existing.get(&date("01.01.2024")).unwrap();
        assert_eq!(Some(30.5),merged.parties.get(&Party::CduCsu).copied());
        assert_eq!(Some(20.0),merged.parties.get(&Party::Spd).copied());
    }

    #[test]
    fn merge_of_disjoint_batches_commutes() {
        let mut batch_a = PollsterHistory::new();
        batch_a.insert(record("01.01.2024",30.0,20.0));
        let mut batch_b = PollsterHistory::new();
        batch_b.insert(record("08.01.2024",31.0,19.0));
        let mut ab = batch_a.clone();
        ab.merge(batch_b.clone());
        let mut ba = batch_b;
        ba.merge(batch_a);
        assert_eq!(ab,ba);
    }
}
