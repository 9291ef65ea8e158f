// Copyright 2024 the Sonntagsfrage developers.
// This file is part of Sonntagsfrage.
// Sonntagsfrage is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// Sonntagsfrage is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with Sonntagsfrage.  If not, see <https://www.gnu.org/licenses/>.


//! End-to-end decoding tests against small inline copies of the source's
//! table layout, including its known quirks.


#[cfg(test)]
mod tests {
    use scraper::Html;
    use survey::fields::{FieldId, Party};
    use survey::record::{parse_publication_date, DayMonth, SampleSize, SurveyMethod};
    use crate::parse_table::{locate_table, parse_survey_table, resolve_headers, StructureError};
    use crate::parse_page;

    fn date(s:&str) -> chrono::NaiveDate { parse_publication_date(s).unwrap() }

    const FULL_PAGE : &str = r##"<html><body><div class="frame">
      <table class="wilko">
        <thead><tr>
          <th class="dat">Datum</th>
          <th class="part">CDU/CSU</th>
          <th class="part">SPD</th>
          <th><a href="gruene.htm">GRÜNE</a></th>
          <th class="part">AfD</th>
          <th class="dat2">Nichtw&auml;hler/Unentschl.</th>
          <th class="befr">Befragte</th>
          <th class="dat2">Zeitraum</th>
        </tr></thead>
        <tbody>
          <tr><td>12.01.2024</td><td>31,5 %</td><td>14 %</td><td>13,5 %</td><td>22 %</td><td>23,5 %</td><td>1.502 &bull; <a href="#fn-t">T</a></td><td>09.01.&ndash;11.01.</td></tr>
          <tr><td>05.01.2024</td><td>31 %</td><td>15 %</td><td>&ndash;</td><td>21,5 %</td><td></td><td>2.013</td><td>04.01.</td></tr>
        </tbody>
      </table>
    </div></body></html>"##;

    #[test]
    fn decodes_a_full_page() {
        let history = parse_page(FULL_PAGE).unwrap();
        assert_eq!(2,history.len());

        let newest = history.get(&date("12.01.2024")).unwrap();
        assert_eq!(Some(31.5),newest.parties.get(&Party::CduCsu).copied());
        assert_eq!(Some(14.0),newest.parties.get(&Party::Spd).copied());
        assert_eq!(Some(13.5),newest.parties.get(&Party::Gruene).copied());
        assert_eq!(Some(22.0),newest.parties.get(&Party::Afd).copied());
        assert_eq!(Some(23.5),newest.non_voters);
        assert_eq!(Some(SampleSize{count:1502,method:SurveyMethod::Telephone}),newest.surveyed_count);
        let period = newest.collection_period.unwrap();
        assert_eq!(DayMonth{day:9,month:1},period.start);
        assert_eq!(DayMonth{day:11,month:1},period.end);

        // a dash decodes to 0, an empty cell decodes to 0, no marker means standard
        let older = history.get(&date("05.01.2024")).unwrap();
        assert_eq!(Some(0.0),older.parties.get(&Party::Gruene).copied());
        assert_eq!(Some(0.0),older.non_voters);
        assert_eq!(Some(SampleSize{count:2013,method:SurveyMethod::Standard}),older.surveyed_count);
        // a period without a separator is a single-day period
        let period = older.collection_period.unwrap();
        assert_eq!(period.start,period.end);
        assert_eq!(DayMonth{day:4,month:1},period.start);

        // newest first
        assert_eq!(vec![date("12.01.2024"),date("05.01.2024")],history.dates_newest_first().collect::<Vec<_>>());
    }

    #[test]
    fn dat2_with_unexpected_text_is_the_non_voter_column() {
        let html = Html::parse_document(r#"<table>
          <thead><tr><th class="dat">Datum</th><th class="befr">Befragte</th><th class="part">CDU/CSU</th><th class="part">SPD</th><th class="dat2">Nichtwähler/Unentschl.</th></tr></thead>
          <tbody></tbody></table>"#);
        let (head,_) = locate_table(&html).unwrap();
        let fields = resolve_headers(head).unwrap();
        assert_eq!(vec![FieldId::PublicationDate,FieldId::SurveyedCount,FieldId::Party(Party::CduCsu),FieldId::Party(Party::Spd),FieldId::NonVoters],fields);
    }

    #[test]
    fn misencoded_party_header_still_resolves() {
        let html = Html::parse_document(r#"<table>
          <thead><tr><th class="dat">Datum</th><th class="part">GRÃœNE</th><th class="xyz">Projektion</th></tr></thead>
          <tbody></tbody></table>"#);
        let (head,_) = locate_table(&html).unwrap();
        let fields = resolve_headers(head).unwrap();
        assert_eq!(vec![FieldId::PublicationDate,FieldId::Party(Party::Gruene),FieldId::Unknown],fields);
    }

    #[test]
    fn duplicate_dates_keep_the_last_row() {
        let history = parse_page(r#"<table>
          <thead><tr><th class="dat">Datum</th><th class="part">CDU/CSU</th><th class="part">SPD</th></tr></thead>
          <tbody>
            <tr><td>01.01.2024</td><td>30,0%</td><td>20,0%</td></tr>
            <tr><td>01.01.2024</td><td>31,0%</td><td>19,5%</td></tr>
          </tbody></table>"#).unwrap();
        assert_eq!(1,history.len());
        let record = history.get(&date("01.01.2024")).unwrap();
        assert_eq!(Some(31.0),record.parties.get(&Party::CduCsu).copied());
        assert_eq!(Some(19.5),record.parties.get(&Party::Spd).copied());
    }

    #[test]
    fn short_rows_and_dateless_rows_are_skipped() {
        let history = parse_page(r#"<table>
          <thead><tr><th class="dat">Datum</th><th class="part">CDU/CSU</th><th class="part">SPD</th></tr></thead>
          <tbody>
            <tr><td>01.01.2024</td><td>30,0%</td></tr>
            <tr><td>Bundestagswahl</td><td>33,0%</td><td>25,7%</td></tr>
            <tr><td>08.01.2024</td><td>29,5%</td><td>20,5%</td></tr>
          </tbody></table>"#).unwrap();
        assert_eq!(1,history.len());
        assert!(history.get(&date("08.01.2024")).is_some());
    }

    #[test]
    fn missing_structure_is_fatal() {
        assert!(matches!(parse_page("<p>no table here</p>"),Err(StructureError::NoTable)));
        assert!(matches!(parse_page("<table><tbody></tbody></table>"),Err(StructureError::NoTableHead)));
        assert!(matches!(parse_page("<table><thead><tr><th class=\"dat\">Datum</th></tr></thead></table>"),Err(StructureError::NoTableBody)));
        let html = Html::parse_document("<table><thead></thead><tbody></tbody></table>");
        let (head,_) = locate_table(&html).unwrap();
        assert!(matches!(resolve_headers(head),Err(StructureError::NoHeaders)));
        assert!(matches!(parse_survey_table(&html),Err(StructureError::NoHeaders)));
    }
}
