//! Political parties contesting the election

use serde::{Deserialize, Serialize};

/// Party id used for independents
pub const INDEPENDENT_PARTY_ID: &str = "independent";

/// Party id used as the catch-all for unknown or minor parties
pub const OTHER_PARTY_ID: &str = "other";

/// A political party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Stable id used in structured forecasts (e.g. "ldp")
    pub id: String,
    /// Full Japanese name
    pub name: String,
    pub name_en: String,
    /// Abbreviation used in candidate listings (e.g. "自民")
    pub short_name: String,
    /// Display color (hex)
    pub color: String,
}

impl Party {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        name_en: impl Into<String>,
        short_name: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            name_en: name_en.into(),
            short_name: short_name.into(),
            color: color.into(),
        }
    }

    /// Entry in the prompt party list: `name（short）`, or the bare name for independents
    pub fn list_entry(&self) -> String {
        if self.id == INDEPENDENT_PARTY_ID {
            self.name.clone()
        } else {
            format!("{}（{}）", self.name, self.short_name)
        }
    }
}

const PARTIES: &[(&str, &str, &str, &str, &str)] = &[
    ("ldp", "自由民主党", "Liberal Democratic Party", "自民", "#e31e26"),
    ("chudou", "中道改革連合", "Chudou Reform Alliance", "中道", "#00a0e9"),
    ("ishin", "日本維新の会", "Japan Innovation Party", "維新", "#38b649"),
    ("dpfp", "国民民主党", "Democratic Party for the People", "国民", "#f39800"),
    ("sanseito", "参政党", "Sanseito", "参政", "#ff6600"),
    ("jcp", "日本共産党", "Japanese Communist Party", "共産", "#c71c22"),
    ("reiwa", "れいわ新選組", "Reiwa Shinsengumi", "れいわ", "#ed6d9b"),
    ("shamin", "社会民主党", "Social Democratic Party", "社民", "#e85298"),
    (INDEPENDENT_PARTY_ID, "無所属", "Independent", "無", "#6b7280"),
    (OTHER_PARTY_ID, "その他", "Other", "他", "#9ca3af"),
];

/// The built-in party table
pub fn builtin_parties() -> Vec<Party> {
    PARTIES
        .iter()
        .map(|&(id, name, name_en, short, color)| Party::new(id, name, name_en, short, color))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_ends_with_catch_all() {
        let parties = builtin_parties();
        assert_eq!(parties.len(), 10);
        assert_eq!(parties.last().map(|p| p.id.as_str()), Some(OTHER_PARTY_ID));
    }

    #[test]
    fn list_entry_uses_fullwidth_parentheses() {
        let ldp = &builtin_parties()[0];
        assert_eq!(ldp.list_entry(), "自由民主党（自民）");
    }

    #[test]
    fn independents_have_no_abbreviation_in_list() {
        let parties = builtin_parties();
        let independent = parties
            .iter()
            .find(|p| p.id == INDEPENDENT_PARTY_ID)
            .unwrap();
        assert_eq!(independent.list_entry(), "無所属");
    }
}
