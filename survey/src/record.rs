// Copyright 2024 the Sonntagsfrage developers.
// This file is part of Sonntagsfrage.
// Sonntagsfrage is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// Sonntagsfrage is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with Sonntagsfrage.  If not, see <https://www.gnu.org/licenses/>.


//! One survey record: the typed row of results one pollster published on one
//! date, plus the per-field parsing rules that turn raw table cells into it.
//! Cell-level parse failures decode to a defined default with a warning; the
//! publication date is the one field whose failure makes a row unusable.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use crate::fields::Party;

/// How the respondents of a poll were reached.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum SurveyMethod {
    /// No method marker on the source row.
    Standard,
    Online,
    Telephone,
    Personal,
    TelephoneOnlineMix,
}

impl SurveyMethod {
    /// The marker code the source annotates sample sizes with, e.g. `1.234 • T`.
    pub fn code(self) -> Option<&'static str> {
        match self {
            SurveyMethod::Standard => None,
            SurveyMethod::Online => Some("O"),
            SurveyMethod::Telephone => Some("T"),
            SurveyMethod::Personal => Some("P"),
            SurveyMethod::TelephoneOnlineMix => Some("TOM"),
        }
    }
    pub fn from_code(code:&str) -> Option<SurveyMethod> {
        match code {
            "O" => Some(SurveyMethod::Online),
            "T" => Some(SurveyMethod::Telephone),
            "P" => Some(SurveyMethod::Personal),
            "TOM" => Some(SurveyMethod::TelephoneOnlineMix),
            _ => None,
        }
    }
}

impl Display for SurveyMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SurveyMethod::Standard => "standard",
            SurveyMethod::Online => "online",
            SurveyMethod::Telephone => "telephone",
            SurveyMethod::Personal => "personal",
            SurveyMethod::TelephoneOnlineMix => "telephone_online_mix",
        })
    }
}

/// Sample size of a poll together with the survey method.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct SampleSize {
    pub count : u32,
    pub method : SurveyMethod,
}

impl SampleSize {
    /// Decode a sample size cell. `marker` is the text of the embedded method
    /// marker link, if the cell has one. Thousands separators and the marker
    /// annotation are stripped; an unparsable residue decodes to a count of 0
    /// with a warning rather than failing the row.
    pub fn parse(text:&str, marker:Option<&str>) -> SampleSize {
        let (method,cleaned) = match marker.and_then(SurveyMethod::from_code) {
            Some(method) => (method,text.replace(method.code().unwrap(),"").replace('•'," ")),
            None => (SurveyMethod::Standard,text.to_string()),
        };
        let cleaned = cleaned.replace('.',"");
        match cleaned.trim().parse::<u32>() {
            Ok(count) => SampleSize{count,method},
            Err(_) => {
                warn!("could not parse sample size {:?}",text);
                SampleSize{count:0,method}
            }
        }
    }
}

/// Store format is the count followed by the method code, if any: `1234 T`.
impl Display for SampleSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.method.code() {
            None => write!(f,"{}",self.count),
            Some(code) => write!(f,"{} {}",self.count,code),
        }
    }
}

impl std::str::FromStr for SampleSize {
    type Err = ();
    fn from_str(s:&str) -> Result<Self,()> {
        let mut tokens = s.split_whitespace();
        let count : u32 = tokens.next().ok_or(())?.parse().map_err(|_|())?;
        let method = match tokens.next() {
            None => SurveyMethod::Standard,
            Some(code) => SurveyMethod::from_code(code).ok_or(())?,
        };
        if tokens.next().is_some() { return Err(()); }
        Ok(SampleSize{count,method})
    }
}

/// Days in the months of a non-leap year, cumulative.
const DAYS_BEFORE_MONTH : [u32;12] = [0,31,59,90,120,151,181,212,243,273,304,334];

/// A day and month without a year. The source gives collection periods as
/// `12.03.–14.03.` with no year at all, so this cannot be a calendar date.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Serialize, Deserialize)]
pub struct DayMonth {
    pub day : u32,
    pub month : u32,
}

impl DayMonth {
    /// Parse `12.03.` (trailing dot optional).
    pub fn parse(text:&str) -> Option<DayMonth> {
        let (day,month) = text.trim().trim_end_matches('.').split_once('.')?;
        let day : u32 = day.trim().parse().ok()?;
        let month : u32 = month.trim().parse().ok()?;
        if day==0 || day>31 || month==0 || month>12 { return None; }
        Some(DayMonth{day,month})
    }

    /// Day-of-year position, counted in a non-leap year, 1..=365.
    pub fn ordinal(self) -> u32 {
        DAYS_BEFORE_MONTH[(self.month-1) as usize]+self.day
    }
}

impl Display for DayMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f,"{:02}.{:02}.",self.day,self.month)
    }
}

/// The date range a poll's interviews were conducted over.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct CollectionPeriod {
    pub start : DayMonth,
    pub end : DayMonth,
}

impl CollectionPeriod {
    /// Decode a collection period cell: start and end separated by an en or em
    /// dash; a cell without a separator is a single-day period. Returns None
    /// (with a warning) if either side fails to parse as day.month.
    pub fn parse(text:&str) -> Option<CollectionPeriod> {
        let (start,end) = match text.split_once('–').or_else(||text.split_once('—')) {
            Some((start,end)) => (start,end),
            None => (text,text),
        };
        match (DayMonth::parse(start),DayMonth::parse(end)) {
            (Some(start),Some(end)) => Some(CollectionPeriod{start,end}),
            _ => {
                warn!("could not parse collection period {:?}",text);
                None
            }
        }
    }

    /// The midpoint of the period as a day-of-year position. A period whose
    /// end precedes its start is taken to wrap December into January, and the
    /// midpoint is brought back into 1..=365.
    pub fn midpoint_ordinal(&self) -> f64 {
        let start = self.start.ordinal() as f64;
        let mut end = self.end.ordinal() as f64;
        if end<start { end+=365.0; }
        let mid = (start+end)/2.0;
        if mid>365.0 { mid-365.0 } else { mid }
    }
}

impl Display for CollectionPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f,"{}–{}",self.start,self.end)
    }
}

impl std::str::FromStr for CollectionPeriod {
    type Err = ();
    fn from_str(s:&str) -> Result<Self,()> {
        let (start,end) = s.split_once('–').ok_or(())?;
        match (DayMonth::parse(start),DayMonth::parse(end)) {
            (Some(start),Some(end)) => Ok(CollectionPeriod{start,end}),
            _ => Err(()),
        }
    }
}

/// Decode a percentage cell. Decimal comma becomes a decimal point, the
/// percent sign is stripped, a dash or empty cell means the party was not
/// listed and decodes to 0. Non-numeric residue decodes to 0 with a warning.
pub fn parse_percentage(text:&str) -> f64 {
    let cleaned = text.replace(',',".").replace('%',"");
    let cleaned = cleaned.trim();
    if cleaned=="–" || cleaned=="—" || cleaned.is_empty() { return 0.0; }
    match cleaned.parse::<f64>() {
        Ok(percentage) => percentage,
        Err(_) => {
            warn!("could not parse percentage {:?}",text);
            0.0
        }
    }
}

/// Percentages are kept to one decimal, as published.
pub fn format_percentage(value:f64) -> String { format!("{:.1}",value) }

/// The source publishes dates as day.month.year.
pub const PUBLICATION_DATE_FORMAT : &str = "%d.%m.%Y";

pub fn parse_publication_date(text:&str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(),PUBLICATION_DATE_FORMAT).ok()
}

pub fn format_publication_date(date:NaiveDate) -> String {
    date.format(PUBLICATION_DATE_FORMAT).to_string()
}

/// One row of results for one publication date from one pollster. Fields the
/// source did not provide (or that failed to parse) are absent rather than
/// defaulted, so a later scrape can fill them in without a conflict.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub publication_date : NaiveDate,
    pub collection_period : Option<CollectionPeriod>,
    pub surveyed_count : Option<SampleSize>,
    pub non_voters : Option<f64>,
    pub parties : BTreeMap<Party,f64>,
}

impl SurveyRecord {
    pub fn new(publication_date:NaiveDate) -> Self {
        SurveyRecord{publication_date,collection_period:None,surveyed_count:None,non_voters:None,parties:BTreeMap::new()}
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crate::record::{parse_percentage, parse_publication_date, format_publication_date, CollectionPeriod, DayMonth, SampleSize, SurveyMethod};

    #[test]
    fn percentage_decoding() {
        assert_eq!(32.5,parse_percentage("32,5 %"));
        assert_eq!(0.0,parse_percentage("–"));
        assert_eq!(0.0,parse_percentage(""));
        assert_eq!(0.0,parse_percentage("k.A."));
        assert_eq!(5.0,parse_percentage("5"));
    }

    #[test]
    fn sample_size_decoding() {
        assert_eq!(SampleSize{count:1234,method:SurveyMethod::Telephone},SampleSize::parse("1.234 • T",Some("T")));
        assert_eq!(SampleSize{count:1234,method:SurveyMethod::Standard},SampleSize::parse("1.234",None));
        assert_eq!(SampleSize{count:2005,method:SurveyMethod::TelephoneOnlineMix},SampleSize::parse("2.005 • TOM",Some("TOM")));
        // unknown marker code: not stripped, count unusable, decodes to 0
        assert_eq!(SampleSize{count:0,method:SurveyMethod::Standard},SampleSize::parse("1.234 • X",Some("X")));
    }

    #[test]
    fn sample_size_store_round_trip() {
        for sample in [SampleSize{count:1234,method:SurveyMethod::Telephone},SampleSize{count:502,method:SurveyMethod::Standard}] {
            assert_eq!(Ok(sample),sample.to_string().parse::<SampleSize>());
        }
    }

    #[test]
    fn collection_period_decoding() {
        let period = CollectionPeriod::parse("12.03.–14.03.").unwrap();
        assert_eq!(DayMonth{day:12,month:3},period.start);
        assert_eq!(DayMonth{day:14,month:3},period.end);
        assert_eq!(72.0,period.midpoint_ordinal()); // day 72 of the year = 13 March
        let single = CollectionPeriod::parse("14.03.").unwrap();
        assert_eq!(single.start,single.end);
        assert_eq!(DayMonth{day:14,month:3},single.start);
        assert!(CollectionPeriod::parse("Bundestagswahl").is_none());
    }

    #[test]
    fn collection_period_wraps_year_end() {
        let period = CollectionPeriod::parse("29.12.–02.01.").unwrap();
        // 29 December is day 363, 2 January is day 367 of the same notional year,
        // so the midpoint is 31 December, day 365.
        assert_eq!(365.0,period.midpoint_ordinal());
        // a midpoint past the year end wraps around
        let period = CollectionPeriod::parse("31.12.–02.01.").unwrap();
        assert_eq!(1.0,period.midpoint_ordinal());
    }

    #[test]
    fn publication_date_round_trip() {
        for text in ["01.01.2024","29.02.2024","31.12.1999"] {
            let parsed = parse_publication_date(text).unwrap();
            assert_eq!(text,format_publication_date(parsed));
        }
        assert_eq!(Some(NaiveDate::from_ymd_opt(2024,1,1).unwrap()),parse_publication_date("01.01.2024"));
        assert_eq!(None,parse_publication_date("2024-01-01"));
        assert_eq!(None,parse_publication_date("30.02.2024"));
    }
}
