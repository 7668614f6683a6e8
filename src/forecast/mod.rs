//! Structured forecasts and their schemas
//!
//! The extraction stage must return one of three shapes depending on the
//! entity kind. A payload that does not parse is [`OutputError::Malformed`];
//! one that parses but does not fit the shape is
//! [`OutputError::SchemaViolation`]. Neither ever reaches a result collection.

mod schema;
mod types;

pub use schema::{OutputError, OutputSchema, SchemaSet};
pub use types::{
    BlockForecast, CandidateForecast, DistrictForecast, Forecast, KeyIssue, Level,
    NationalForecast, NationalTrend, PartyNumbers, RegionalForecast,
};
