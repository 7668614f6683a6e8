//! Output schemas for the extraction stage
//!
//! Each entity kind has one statically declared forecast type. Its JSON
//! schema description is generated once when the [`SchemaSet`] is built and
//! handed to the extraction service as a response-shape hint; responses are
//! then validated by deserializing into the same type.

use super::types::{BlockForecast, Forecast, NationalForecast, RegionalForecast};
use crate::data::EntityKind;
use schemars::generate::SchemaSettings;
use schemars::JsonSchema;
use serde_json::Value;
use thiserror::Error;

/// Longest raw-payload excerpt carried in an error message (in chars)
const RAW_PREVIEW_CHARS: usize = 500;

/// Why an extraction payload was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OutputError {
    /// Not parseable as JSON
    #[error("malformed output: {0}")]
    Malformed(String),
    /// Parseable, but not the contracted shape
    #[error("schema violation: {0}")]
    SchemaViolation(String),
}

/// Schema for one entity kind
#[derive(Debug, Clone)]
pub struct OutputSchema {
    kind: EntityKind,
    description: Value,
}

impl OutputSchema {
    pub fn for_kind(kind: EntityKind) -> Self {
        let description = match kind {
            EntityKind::National => describe::<NationalForecast>(),
            EntityKind::Regional => describe::<RegionalForecast>(),
            EntityKind::Block => describe::<BlockForecast>(),
        };
        Self { kind, description }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// JSON schema description (inlined, no `$ref`s)
    pub fn description(&self) -> &Value {
        &self.description
    }

    /// Parse and validate a raw extraction payload
    pub fn validate(&self, raw: &str) -> Result<Forecast, OutputError> {
        let body = strip_code_fence(raw);
        let value: Value = serde_json::from_str(body).map_err(|e| {
            OutputError::Malformed(format!("{}. Raw: {}", e, preview(raw)))
        })?;
        self.validate_value(value)
    }

    /// Validate an already-parsed payload
    pub fn validate_value(&self, value: Value) -> Result<Forecast, OutputError> {
        let result = match self.kind {
            EntityKind::National => serde_json::from_value(value).map(Forecast::National),
            EntityKind::Regional => serde_json::from_value(value).map(Forecast::Regional),
            EntityKind::Block => serde_json::from_value(value).map(Forecast::Block),
        };
        result.map_err(|e| OutputError::SchemaViolation(format!("{} forecast: {}", self.kind, e)))
    }
}

/// Schemas for all entity kinds, built once
#[derive(Debug, Clone)]
pub struct SchemaSet {
    national: OutputSchema,
    regional: OutputSchema,
    block: OutputSchema,
}

impl Default for SchemaSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaSet {
    pub fn new() -> Self {
        Self {
            national: OutputSchema::for_kind(EntityKind::National),
            regional: OutputSchema::for_kind(EntityKind::Regional),
            block: OutputSchema::for_kind(EntityKind::Block),
        }
    }

    pub fn get(&self, kind: EntityKind) -> &OutputSchema {
        match kind {
            EntityKind::National => &self.national,
            EntityKind::Regional => &self.regional,
            EntityKind::Block => &self.block,
        }
    }
}

fn describe<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|s| {
            s.inline_subschemas = true;
            s.meta_schema = None;
        })
        .into_generator();
    let mut value = generator.into_root_schema_for::<T>().to_value();
    strip_annotations(&mut value);
    value
}

/// Drop keys the extraction service's schema dialect rejects
fn strip_annotations(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("title");
            map.remove("format");
            map.remove("description");
            for child in map.values_mut() {
                strip_annotations(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_annotations),
        _ => {}
    }
}

/// Accept payloads wrapped in a markdown code fence
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn preview(raw: &str) -> String {
    raw.chars().take(RAW_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::Level;
    use serde_json::json;

    fn regional_payload() -> Value {
        json!({
            "prefecture_id": "tottori",
            "prefecture_name": "鳥取県",
            "districts": [{
                "district_id": "tottori-1",
                "district_name": "鳥取県第1区",
                "winner_party": "ldp",
                "confidence": "high",
                "analysis": "優勢",
                "candidates": [
                    { "name": "候補A", "party": "ldp", "vote_share_min": 50, "vote_share_max": 60 }
                ]
            }],
            "overview": "概況"
        })
    }

    #[test]
    fn description_is_inlined_object_schema() {
        let schema = OutputSchema::for_kind(EntityKind::National);
        let description = schema.description();
        assert_eq!(description["type"], "object");
        assert!(description.get("$schema").is_none());
        assert!(description.get("$defs").is_none());
        assert!(description.get("definitions").is_none());

        let required = description["required"].as_array().unwrap();
        assert!(required.contains(&json!("cabinet_approval")));
        assert!(required.contains(&json!("analysis_summary")));

        let trend = &description["properties"]["national_trend"];
        assert_eq!(
            trend["enum"],
            json!(["ruling_advantage", "opposition_advantage", "close"])
        );
    }

    #[test]
    fn party_maps_are_open_objects() {
        let schema = OutputSchema::for_kind(EntityKind::Block);
        let seats = &schema.description()["properties"]["party_seats"];
        assert_eq!(seats["type"], "object");
        assert_eq!(seats["additionalProperties"]["type"], "number");
    }

    #[test]
    fn valid_payload_becomes_forecast() {
        let schema = OutputSchema::for_kind(EntityKind::Regional);
        let forecast = schema.validate(&regional_payload().to_string()).unwrap();
        let regional = forecast.as_regional().unwrap();
        assert_eq!(regional.districts.len(), 1);
        assert_eq!(regional.districts[0].confidence, Level::High);
    }

    #[test]
    fn fenced_payload_is_accepted() {
        let schema = OutputSchema::for_kind(EntityKind::Regional);
        let raw = format!("```json\n{}\n```", regional_payload());
        assert!(schema.validate(&raw).is_ok());
    }

    #[test]
    fn unparseable_payload_is_malformed() {
        let schema = OutputSchema::for_kind(EntityKind::Block);
        let err = schema.validate("not json {").unwrap_err();
        assert!(matches!(err, OutputError::Malformed(ref m) if m.contains("not json")));
    }

    #[test]
    fn missing_field_is_schema_violation() {
        let schema = OutputSchema::for_kind(EntityKind::Regional);
        let mut payload = regional_payload();
        payload.as_object_mut().unwrap().remove("overview");
        let err = schema.validate(&payload.to_string()).unwrap_err();
        assert!(matches!(err, OutputError::SchemaViolation(ref m) if m.contains("overview")));
    }

    #[test]
    fn out_of_range_enum_is_schema_violation() {
        let schema = OutputSchema::for_kind(EntityKind::Regional);
        let mut payload = regional_payload();
        payload["districts"][0]["confidence"] = json!("certain");
        assert!(matches!(
            schema.validate(&payload.to_string()),
            Err(OutputError::SchemaViolation(_))
        ));
    }

    #[test]
    fn payload_for_other_kind_is_rejected() {
        let schema = OutputSchema::for_kind(EntityKind::Block);
        assert!(matches!(
            schema.validate(&regional_payload().to_string()),
            Err(OutputError::SchemaViolation(_))
        ));
    }

    #[test]
    fn schema_set_returns_matching_kind() {
        let set = SchemaSet::new();
        for kind in [EntityKind::National, EntityKind::Regional, EntityKind::Block] {
            assert_eq!(set.get(kind).kind(), kind);
        }
    }
}
