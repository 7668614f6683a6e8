//! Candidate filings

use serde::{Deserialize, Serialize};

/// Incumbency status of a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Incumbent,
    Former,
    New,
}

/// A registered candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub party_id: String,
    /// `None` for proportional-list-only candidates
    pub district_id: Option<String>,
    pub status: CandidateStatus,
}

impl Candidate {
    /// Candidate standing in a single-member district
    pub fn in_district(
        id: impl Into<String>,
        name: impl Into<String>,
        party_id: impl Into<String>,
        district_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            party_id: party_id.into(),
            district_id: Some(district_id.into()),
            status: CandidateStatus::New,
        }
    }

    /// Candidate on a proportional list only
    pub fn list_only(
        id: impl Into<String>,
        name: impl Into<String>,
        party_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            party_id: party_id.into(),
            district_id: None,
            status: CandidateStatus::New,
        }
    }

    pub fn with_status(mut self, status: CandidateStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether this candidate stands in a district of the given prefecture
    pub fn stands_in_prefecture(&self, prefecture_id: &str) -> bool {
        self.district_id
            .as_deref()
            .and_then(|d| d.strip_prefix(prefecture_id))
            .is_some_and(|rest| rest.starts_with('-'))
    }
}

/// The built-in candidate table.
///
/// Only sample filings until official lists are published.
pub fn builtin_candidates() -> Vec<Candidate> {
    vec![
        Candidate::in_district("hokkaido-1-ldp", "サンプル太郎", "ldp", "hokkaido-1")
            .with_status(CandidateStatus::Incumbent),
        Candidate::in_district("hokkaido-1-chudou", "サンプル花子", "chudou", "hokkaido-1"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefecture_match_requires_separator() {
        let c = Candidate::in_district("c1", "山田太郎", "ldp", "tokyo-1");
        assert!(c.stands_in_prefecture("tokyo"));
        assert!(!c.stands_in_prefecture("tok"));
    }

    #[test]
    fn list_only_candidates_match_no_prefecture() {
        let c = Candidate::list_only("c2", "鈴木花子", "ishin");
        assert!(!c.stands_in_prefecture("tokyo"));
    }
}
