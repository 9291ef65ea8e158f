// Copyright 2024 the Sonntagsfrage developers.
// This file is part of Sonntagsfrage.
// Sonntagsfrage is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// Sonntagsfrage is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with Sonntagsfrage.  If not, see <https://www.gnu.org/licenses/>.


//! The flat text store for a pollster history. One block per publication date,
//! newest first, blocks separated by a blank line, each line `key: value` with
//! the canonical short key. The file is the sole durable copy; it is rewritten
//! wholesale through a temporary file so a failed write cannot corrupt it.

use std::path::Path;
use log::warn;
use thiserror::Error;
use crate::fields::FieldId;
use crate::history::PollsterHistory;
use crate::record::{format_percentage, format_publication_date, parse_publication_date, SurveyRecord};

#[derive(Error,Debug)]
pub enum StoreError {
    #[error("could not access store file: {0}")]
    Io(#[from] std::io::Error),
    #[error("store line {0} is not of the form `key: value`")]
    MalformedLine(usize),
    #[error("store block ending at line {0} has no publication date")]
    MissingDate(usize),
    #[error("store has unparsable value for {key}: {value:?}")]
    BadValue { key : String, value : String },
}

/// Serialize a history to the flat text format, newest date first.
pub fn encode(history:&PollsterHistory) -> String {
    let mut out = String::new();
    for record in history.iter_newest_first() {
        out.push_str(&format!("dat: {}\n",format_publication_date(record.publication_date)));
        if let Some(period) = record.collection_period { out.push_str(&format!("dat2: {}\n",period)); }
        if let Some(sample) = record.surveyed_count { out.push_str(&format!("befr: {}\n",sample)); }
        if let Some(non_voters) = record.non_voters { out.push_str(&format!("non: {}\n",format_percentage(non_voters))); }
        for (party,value) in &record.parties {
            out.push_str(&format!("{}: {}\n",party.store_key(),format_percentage(*value)));
        }
        out.push('\n');
    }
    out
}

/// Parse the flat text format back into a history. A malformed line or an
/// unparsable value is a hard error: a corrupt store should be noticed, not
/// silently thinned out on the next rewrite. Unrecognized keys are the one
/// exception, warned about and ignored.
pub fn decode(text:&str) -> Result<PollsterHistory,StoreError> {
    let mut history = PollsterHistory::new();
    let mut record : Option<SurveyRecord> = None;
    for (index,line) in text.lines().enumerate() {
        let line_number = index+1;
        if line.trim().is_empty() {
            if let Some(record) = record.take() { history.insert(record); }
            continue;
        }
        let (key,value) = line.split_once(':').ok_or(StoreError::MalformedLine(line_number))?;
        let (key,value) = (key.trim(),value.trim());
        if key=="dat" {
            let parsed = parse_publication_date(value).ok_or_else(||StoreError::BadValue{key:key.to_string(),value:value.to_string()})?;
            if let Some(previous) = record.take() { history.insert(previous); }
            record = Some(SurveyRecord::new(parsed));
            continue;
        }
        let record = record.as_mut().ok_or(StoreError::MissingDate(line_number))?;
        let bad = ||StoreError::BadValue{key:key.to_string(),value:value.to_string()};
        match FieldId::from_store_key(key) {
            Some(FieldId::PublicationDate) => unreachable!(),
            Some(FieldId::CollectionPeriod) => { record.collection_period = Some(value.parse().map_err(|_|bad())?); }
            Some(FieldId::SurveyedCount) => { record.surveyed_count = Some(value.parse().map_err(|_|bad())?); }
            Some(FieldId::NonVoters) => { record.non_voters = Some(value.parse().map_err(|_|bad())?); }
            Some(FieldId::Party(party)) => { record.parties.insert(party,value.parse().map_err(|_|bad())?); }
            Some(FieldId::Unknown) | None => { warn!("ignoring unrecognized store key {:?} on line {}",key,line_number); }
        }
    }
    if let Some(record) = record.take() { history.insert(record); }
    Ok(history)
}

/// Load a history from its store file.
pub fn load_history<P:AsRef<Path>>(path:P) -> Result<PollsterHistory,StoreError> {
    decode(&std::fs::read_to_string(path)?)
}

/// Load a history, treating a store file that does not exist yet as empty.
pub fn load_history_or_empty<P:AsRef<Path>>(path:P) -> Result<PollsterHistory,StoreError> {
    match std::fs::read_to_string(path) {
        Ok(text) => decode(&text),
        Err(e) if e.kind()==std::io::ErrorKind::NotFound => Ok(PollsterHistory::new()),
        Err(e) => Err(e.into()),
    }
}

/// Rewrite a store file wholesale, all-or-nothing: the encoded text goes to a
/// sibling temporary file which is then renamed over the store.
pub fn write_history<P:AsRef<Path>>(path:P,history:&PollsterHistory) -> Result<(),StoreError> {
    write_atomically(path.as_ref(),&encode(history))
}

pub(crate) fn write_atomically(path:&Path,contents:&str) -> Result<(),StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() { std::fs::create_dir_all(parent)?; }
    }
    let file_name = path.file_name().map(|n|n.to_string_lossy().to_string()).unwrap_or_default();
    let tmp = path.with_file_name(file_name+".tmp");
    std::fs::write(&tmp,contents)?;
    std::fs::rename(&tmp,path)?;
    Ok(())
}
