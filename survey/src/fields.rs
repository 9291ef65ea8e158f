// Copyright 2024 the Sonntagsfrage developers.
// This file is part of Sonntagsfrage.
// Sonntagsfrage is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// Sonntagsfrage is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with Sonntagsfrage.  If not, see <https://www.gnu.org/licenses/>.


//! The canonical field identifiers for a survey table column, independent of
//! whatever display label or CSS class the source happens to use for it.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A party tracked by the Sonntagsfrage. The variant is the stable internal
/// identity; the source's display label (including known mis-encoded forms of
/// it) is resolved to this via [lookup_header_label].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub enum Party {
    CduCsu,
    Spd,
    Gruene,
    Fdp,
    Linke,
    Afd,
    Sonstige,
    Bsw,
    Fw,
}

impl Party {
    pub const ALL : [Party; 9] = [Party::CduCsu, Party::Spd, Party::Gruene, Party::Fdp, Party::Linke, Party::Afd, Party::Sonstige, Party::Bsw, Party::Fw];

    /// The short key used in store files, e.g. `party-cdu_csu`.
    pub fn store_key(self) -> &'static str {
        match self {
            Party::CduCsu => "party-cdu_csu",
            Party::Spd => "party-spd",
            Party::Gruene => "party-gruene",
            Party::Fdp => "party-fdp",
            Party::Linke => "party-linke",
            Party::Afd => "party-afd",
            Party::Sonstige => "party-sonstige",
            Party::Bsw => "party-bsw",
            Party::Fw => "party-fw",
        }
    }

    /// The conventional display name, used in chart legends.
    pub fn display_name(self) -> &'static str {
        match self {
            Party::CduCsu => "CDU/CSU",
            Party::Spd => "SPD",
            Party::Gruene => "GRÜNE",
            Party::Fdp => "FDP",
            Party::Linke => "LINKE",
            Party::Afd => "AfD",
            Party::Sonstige => "Sonstige",
            Party::Bsw => "BSW",
            Party::Fw => "FW",
        }
    }

    /// The conventional chart color for the party.
    pub fn color(self) -> &'static str {
        match self {
            Party::CduCsu => "#000000",
            Party::Spd => "#E3000F",
            Party::Gruene => "#64A12D",
            Party::Fdp => "#FFED00",
            Party::Linke => "#8C3473",
            Party::Afd => "#009EE0",
            Party::Sonstige => "#808080",
            Party::Bsw => "#FFD700",
            Party::Fw => "#8B4513",
        }
    }

    pub fn from_store_key(key:&str) -> Option<Party> {
        Party::ALL.iter().copied().find(|p|p.store_key()==key)
    }
}

impl Display for Party {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.display_name()) }
}

/// What a column of the source table means. One per header cell, in column
/// order; body cells are decoded positionally against this.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum FieldId {
    /// The date the poll was released. Primary key of a record.
    PublicationDate,
    /// The date range the interviews were conducted over.
    CollectionPeriod,
    /// Sample size, possibly annotated with the survey method.
    SurveyedCount,
    /// Percentage of respondents who would not vote (or are undecided).
    NonVoters,
    /// Percentage for one party.
    Party(Party),
    /// A column whose purpose could not be resolved. Decoded but not stored.
    Unknown,
}

impl FieldId {
    /// The short key used in store files. `Unknown` has no key; it is never persisted.
    pub fn store_key(self) -> Option<&'static str> {
        match self {
            FieldId::PublicationDate => Some("dat"),
            FieldId::CollectionPeriod => Some("dat2"),
            FieldId::SurveyedCount => Some("befr"),
            FieldId::NonVoters => Some("non"),
            FieldId::Party(party) => Some(party.store_key()),
            FieldId::Unknown => None,
        }
    }

    pub fn from_store_key(key:&str) -> Option<FieldId> {
        match key {
            "dat" => Some(FieldId::PublicationDate),
            "dat2" => Some(FieldId::CollectionPeriod),
            "befr" => Some(FieldId::SurveyedCount),
            "non" => Some(FieldId::NonVoters),
            _ => Party::from_store_key(key).map(FieldId::Party),
        }
    }
}

/// Label variants seen in the wild for each header, mapped to the canonical
/// field. Covers the structural CSS classes of the source table, the party
/// display names, and mis-encoded forms of the names with special characters
/// (some fetches have delivered the headers with broken UTF-8 interpreted as
/// Latin-1). Built once, never mutated.
static HEADER_LOOKUP : Lazy<HashMap<&'static str, FieldId>> = Lazy::new(|| {
    let mut map : HashMap<&'static str, FieldId> = HashMap::new();
    map.insert("dat", FieldId::PublicationDate);
    map.insert("dat2", FieldId::CollectionPeriod);
    map.insert("befr", FieldId::SurveyedCount);
    map.insert("non", FieldId::NonVoters);
    map.insert("Nichtwähler/Unentschl.", FieldId::NonVoters);
    map.insert("CDU/CSU", FieldId::Party(Party::CduCsu));
    map.insert("SPD", FieldId::Party(Party::Spd));
    map.insert("GRÜNE", FieldId::Party(Party::Gruene));
    map.insert("GRÃœNE", FieldId::Party(Party::Gruene)); // UTF-8 read as Latin-1
    map.insert("LINKE", FieldId::Party(Party::Linke));
    map.insert("DIE LINKE", FieldId::Party(Party::Linke));
    map.insert("FDP", FieldId::Party(Party::Fdp));
    map.insert("AfD", FieldId::Party(Party::Afd));
    map.insert("Sonstige", FieldId::Party(Party::Sonstige));
    map.insert("BSW", FieldId::Party(Party::Bsw));
    map.insert("FW", FieldId::Party(Party::Fw));
    map
});

/// Resolve a header label (CSS class or visible text) to its canonical field.
pub fn lookup_header_label(label:&str) -> Option<FieldId> {
    HEADER_LOOKUP.get(label.trim()).copied()
}

#[cfg(test)]
mod tests {
    use crate::fields::{lookup_header_label, FieldId, Party};

    #[test]
    fn lookup_accepts_misencoded_party_names() {
        assert_eq!(Some(FieldId::Party(Party::Gruene)),lookup_header_label("GRÜNE"));
        assert_eq!(Some(FieldId::Party(Party::Gruene)),lookup_header_label("GRÃœNE"));
        assert_eq!(Some(FieldId::Party(Party::Linke)),lookup_header_label("LINKE"));
        assert_eq!(Some(FieldId::Party(Party::Linke)),lookup_header_label("DIE LINKE"));
        assert_eq!(None,lookup_header_label("Wahlbeteiligung"));
    }

    #[test]
    fn store_keys_round_trip() {
        for party in Party::ALL {
            assert_eq!(Some(party),Party::from_store_key(party.store_key()));
        }
        for field in [FieldId::PublicationDate,FieldId::CollectionPeriod,FieldId::SurveyedCount,FieldId::NonVoters,FieldId::Party(Party::Bsw)] {
            assert_eq!(Some(field),FieldId::from_store_key(field.store_key().unwrap()));
        }
        assert_eq!(None,FieldId::Unknown.store_key());
    }
}
