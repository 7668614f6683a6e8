//! Variable builders for each entity kind
//!
//! Every builder is pure: the same catalog, entity and date always produce the
//! same variable set.

use super::engine::TemplateVariables;
use crate::data::{Block, Candidate, Catalog, District, Party, Prefecture, OTHER_PARTY_ID};
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

pub const TODAY: &str = "TODAY";
pub const PARTY_LIST: &str = "PARTY_LIST";
pub const PREFECTURE: &str = "PREFECTURE";
pub const PREFECTURE_ID: &str = "PREFECTURE_ID";
pub const DISTRICT_COUNT: &str = "DISTRICT_COUNT";
pub const DISTRICT_LIST: &str = "DISTRICT_LIST";
pub const CANDIDATES_SECTION: &str = "CANDIDATES_SECTION";
pub const BLOCK_NAME: &str = "BLOCK_NAME";
pub const BLOCK_ID: &str = "BLOCK_ID";
pub const SEATS_TOTAL: &str = "SEATS_TOTAL";
pub const BLOCK_PREFECTURES: &str = "BLOCK_PREFECTURES";
pub const SEARCH_REPORT: &str = "SEARCH_REPORT";
pub const SENTIMENT_REPORT: &str = "SENTIMENT_REPORT";

/// Separator for inline Japanese lists
pub const LIST_SEPARATOR: &str = "、";

/// Marker line for a district without candidate filings
pub const NO_CANDIDATES: &str = "候補者情報なし";

/// Japanese long-form date, e.g. `2024年1月28日`
pub fn format_date(date: NaiveDate) -> String {
    format!("{}年{}月{}日", date.year(), date.month(), date.day())
}

/// All parties except the catch-all, as `name（short）` joined by `、`
pub fn build_party_list(parties: &[Party]) -> String {
    parties
        .iter()
        .filter(|p| p.id != OTHER_PARTY_ID)
        .map(Party::list_entry)
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// District display names joined by `、`
pub fn build_district_list(districts: &[District]) -> String {
    districts
        .iter()
        .map(|d| d.name.as_str())
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// One line per district: `name: candidate（party）、…`.
///
/// Candidates without a district are skipped.
pub fn build_candidates_section(
    catalog: &Catalog,
    candidates: &[&Candidate],
    districts: &[District],
) -> String {
    let mut by_district: HashMap<&str, Vec<&Candidate>> = HashMap::new();
    for candidate in candidates {
        if let Some(district_id) = candidate.district_id.as_deref() {
            by_district.entry(district_id).or_default().push(candidate);
        }
    }

    districts
        .iter()
        .map(|district| match by_district.get(district.id.as_str()) {
            Some(list) if !list.is_empty() => {
                let entries = list
                    .iter()
                    .map(|c| {
                        let short = catalog
                            .party(&c.party_id)
                            .map_or(c.party_id.as_str(), |p| p.short_name.as_str());
                        format!("{}（{}）", c.name, short)
                    })
                    .collect::<Vec<_>>()
                    .join(LIST_SEPARATOR);
                format!("{}: {}", district.name, entries)
            }
            _ => format!("{}: {}", district.name, NO_CANDIDATES),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Variables for the national analysis
pub fn national_variables(catalog: &Catalog, date: NaiveDate) -> TemplateVariables {
    TemplateVariables::new()
        .with(TODAY, format_date(date))
        .with(PARTY_LIST, build_party_list(catalog.parties()))
}

/// Variables for one prefecture
pub fn regional_variables(
    catalog: &Catalog,
    prefecture: &Prefecture,
    date: NaiveDate,
) -> TemplateVariables {
    let districts = prefecture.districts();
    let candidates = catalog.candidates_in(&prefecture.id);

    TemplateVariables::new()
        .with(TODAY, format_date(date))
        .with(PREFECTURE, prefecture.name.as_str())
        .with(PREFECTURE_ID, prefecture.id.as_str())
        .with(DISTRICT_COUNT, districts.len())
        .with(DISTRICT_LIST, build_district_list(&districts))
        .with(
            CANDIDATES_SECTION,
            build_candidates_section(catalog, &candidates, &districts),
        )
        .with(PARTY_LIST, build_party_list(catalog.parties()))
}

/// Variables for one proportional block
pub fn block_variables(catalog: &Catalog, block: &Block, date: NaiveDate) -> TemplateVariables {
    let prefecture_names = catalog
        .prefectures_in_block(&block.id)
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR);

    TemplateVariables::new()
        .with(TODAY, format_date(date))
        .with(BLOCK_NAME, block.name.as_str())
        .with(BLOCK_ID, block.id.as_str())
        .with(SEATS_TOTAL, block.seats)
        .with(BLOCK_PREFECTURES, prefecture_names)
        .with(PARTY_LIST, build_party_list(catalog.parties()))
}
