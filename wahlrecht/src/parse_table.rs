// Copyright 2024 the Sonntagsfrage developers.
// This file is part of Sonntagsfrage.
// Sonntagsfrage is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// Sonntagsfrage is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with Sonntagsfrage.  If not, see <https://www.gnu.org/licenses/>.


//! Turning the results table of a wahlrecht.de pollster page into a
//! [PollsterHistory]. A missing table, head or body is fatal for the fetch;
//! everything below that decodes as much as it can, warning about the rest.

use log::warn;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use survey::fields::{lookup_header_label, FieldId};
use survey::history::PollsterHistory;
use survey::record::{format_publication_date, parse_percentage, parse_publication_date, CollectionPeriod, SampleSize, SurveyRecord};

#[derive(Error,Debug)]
pub enum StructureError {
    #[error("no table found")]
    NoTable,
    #[error("no table head found")]
    NoTableHead,
    #[error("no table body found")]
    NoTableBody,
    #[error("no headers found")]
    NoHeaders,
}

/// The whole pipeline for one fetched page: locate the table, resolve its
/// headers, decode its rows.
pub fn parse_survey_table(document:&Html) -> Result<PollsterHistory,StructureError> {
    let (head,body) = locate_table(document)?;
    let fields = resolve_headers(head)?;
    Ok(assemble(body,&fields))
}

/// Find the head and body of the first results table in the document.
pub fn locate_table(document:&Html) -> Result<(ElementRef<'_>,ElementRef<'_>),StructureError> {
    let table = document.select(&Selector::parse("table").unwrap()).next().ok_or(StructureError::NoTable)?;
    let head = table.select(&Selector::parse("thead").unwrap()).next().ok_or(StructureError::NoTableHead)?;
    let body = table.select(&Selector::parse("tbody").unwrap()).next().ok_or(StructureError::NoTableBody)?;
    Ok((head,body))
}

fn inner_text(element:&ElementRef) -> String {
    element.text().map(|s|s.trim()).collect::<Vec<_>>().join("")
}

/// Resolve each header cell to a canonical field, in column order. A cell with
/// a structural class resolves through the class; the `part` class and cells
/// that only carry a party link resolve through the (possibly mis-encoded)
/// party name. Anything unresolvable becomes [FieldId::Unknown], which is
/// decoded but never stored.
///
/// One quirk of the source must be kept: the `dat2` class is used both for the
/// collection period column and for the non-voter column, distinguished only
/// by the visible text, which is `Zeitraum` for the former.
pub fn resolve_headers(head:ElementRef<'_>) -> Result<Vec<FieldId>,StructureError> {
    let selector_a = Selector::parse("a").unwrap();
    let headers : Vec<ElementRef> = head.select(&Selector::parse("th").unwrap()).collect();
    if headers.is_empty() { return Err(StructureError::NoHeaders); }
    let mut fields = vec![];
    for header in headers {
        let text = inner_text(&header);
        let field = match header.value().attr("class").and_then(|classes|classes.split_whitespace().next()) {
            Some("part") => lookup_header_label(&text),
            Some(class) => match lookup_header_label(class) {
                Some(FieldId::CollectionPeriod) if text!="Zeitraum" => Some(FieldId::NonVoters),
                resolved => resolved,
            },
            None => header.select(&selector_a).next().and_then(|a|lookup_header_label(&inner_text(&a))),
        };
        match field {
            Some(field) => fields.push(field),
            None => {
                warn!("column of unknown purpose: {:?}",text);
                fields.push(FieldId::Unknown);
            }
        }
    }
    Ok(fields)
}

/// Decode one body row against the resolved columns. A row whose cell count
/// does not match the header count, or whose publication date does not parse,
/// is skipped with a warning; any other malformed cell decodes to its default.
fn decode_row(row:ElementRef<'_>,fields:&[FieldId]) -> Option<SurveyRecord> {
    let selector_a = Selector::parse("a").unwrap();
    let cells : Vec<ElementRef> = row.select(&Selector::parse("td").unwrap()).collect();
    if cells.len()!=fields.len() {
        warn!("row has {} cells but the header has {} columns, skipping",cells.len(),fields.len());
        return None;
    }
    let date_column = fields.iter().position(|&f|f==FieldId::PublicationDate)?;
    let date_text = inner_text(&cells[date_column]);
    let publication_date = match parse_publication_date(&date_text) {
        Some(date) => date,
        None => {
            warn!("invalid date format: {:?}, skipping row",date_text);
            return None;
        }
    };
    let mut record = SurveyRecord::new(publication_date);
    for (cell,&field) in cells.iter().zip(fields) {
        let text = inner_text(cell);
        match field {
            FieldId::PublicationDate | FieldId::Unknown => {}
            FieldId::CollectionPeriod => { record.collection_period = CollectionPeriod::parse(&text); }
            FieldId::NonVoters => { record.non_voters = Some(parse_percentage(&text)); }
            FieldId::Party(party) => { record.parties.insert(party,parse_percentage(&text)); }
            FieldId::SurveyedCount => {
                let marker = cell.select(&selector_a).next().map(|a|inner_text(&a));
                record.surveyed_count = Some(SampleSize::parse(&text,marker.as_deref()));
            }
        }
    }
    Some(record)
}

/// Decode all body rows into a date-keyed history. Two rows sharing a
/// publication date is a source anomaly; the later row wins, which loses the
/// earlier one, and a warning says so.
pub fn assemble(body:ElementRef<'_>,fields:&[FieldId]) -> PollsterHistory {
    let mut history = PollsterHistory::new();
    if !fields.contains(&FieldId::PublicationDate) {
        warn!("table has no publication date column, nothing to decode");
        return history;
    }
    for row in body.select(&Selector::parse("tr").unwrap()) {
        if let Some(record) = decode_row(row,fields) {
            if let Some(displaced) = history.insert(record) {
                warn!("multiple rows for {}, keeping the last",format_publication_date(displaced.publication_date));
            }
        }
    }
    history
}
