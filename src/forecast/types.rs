//! Structured forecast shapes returned by the extraction stage

use crate::data::EntityKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Party id → number (percentage or seat count)
pub type PartyNumbers = BTreeMap<String, f64>;

/// Three-step rating used for issue importance and prediction confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    High,
    Medium,
    Low,
}

/// Which side the national race favors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NationalTrend {
    RulingAdvantage,
    OppositionAdvantage,
    Close,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KeyIssue {
    pub issue: String,
    pub importance: Level,
    /// Party id the issue favors
    pub favorable_to: String,
}

/// National outlook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NationalForecast {
    /// Cabinet approval rating (percent)
    pub cabinet_approval: f64,
    pub party_support: PartyNumbers,
    pub key_issues: Vec<KeyIssue>,
    pub national_trend: NationalTrend,
    pub seat_projection: PartyNumbers,
    pub district_seats: PartyNumbers,
    pub proportional_seats: PartyNumbers,
    pub analysis_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CandidateForecast {
    pub name: String,
    /// Party id
    pub party: String,
    pub vote_share_min: f64,
    pub vote_share_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DistrictForecast {
    pub district_id: String,
    pub district_name: String,
    /// Party id of the predicted winner
    pub winner_party: String,
    pub confidence: Level,
    pub analysis: String,
    pub candidates: Vec<CandidateForecast>,
}

/// Per-district predictions for one prefecture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RegionalForecast {
    pub prefecture_id: String,
    pub prefecture_name: String,
    pub districts: Vec<DistrictForecast>,
    pub overview: String,
}

/// Seat allocation for one proportional block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BlockForecast {
    pub block_id: String,
    pub block_name: String,
    pub seats_total: f64,
    pub party_seats: PartyNumbers,
    pub analysis: String,
}

impl BlockForecast {
    /// Sum of allocated party seats
    pub fn allocated_seats(&self) -> f64 {
        self.party_seats.values().sum()
    }
}

/// A validated structured object for any entity kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Forecast {
    National(NationalForecast),
    Regional(RegionalForecast),
    Block(BlockForecast),
}

impl Forecast {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::National(_) => EntityKind::National,
            Self::Regional(_) => EntityKind::Regional,
            Self::Block(_) => EntityKind::Block,
        }
    }

    pub fn as_national(&self) -> Option<&NationalForecast> {
        match self {
            Self::National(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_regional(&self) -> Option<&RegionalForecast> {
        match self {
            Self::Regional(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&BlockForecast> {
        match self {
            Self::Block(f) => Some(f),
            _ => None,
        }
    }
}
