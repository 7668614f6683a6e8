//! Three-stage analysis of one entity

use super::types::{AnalysisError, EntityAnalysis, Stage, CALLS_PER_ENTITY};
use crate::client::StageClients;
use crate::data::{Catalog, EntityKey, EntityKind, NATIONAL_ID, NATIONAL_LABEL};
use crate::forecast::{Forecast, SchemaSet};
use crate::prompt::variables::{SEARCH_REPORT, SENTIMENT_REPORT};
use crate::prompt::{
    block_variables, national_variables, regional_variables, render_template, TemplateSet,
    TemplateVariables,
};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, warn};

/// Seat totals closer than this count as equal
const SEAT_TOLERANCE: f64 = 0.5;

/// Runs search and sentiment concurrently, then extraction over both reports.
pub struct EntityAnalyzer {
    catalog: Arc<Catalog>,
    clients: StageClients,
    schemas: SchemaSet,
    /// Fixed analysis date; today (local time) when unset
    date: Option<NaiveDate>,
    auxiliary_tool: bool,
}

impl EntityAnalyzer {
    pub fn new(catalog: Arc<Catalog>, clients: StageClients) -> Self {
        Self {
            catalog,
            clients,
            schemas: SchemaSet::new(),
            date: None,
            auxiliary_tool: true,
        }
    }

    /// Pin the date rendered into prompts
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Whether the sentiment service may run its own secondary lookup
    pub fn with_auxiliary_tool(mut self, enabled: bool) -> Self {
        self.auxiliary_tool = enabled;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    /// Display name and prompt variables for `key`.
    ///
    /// Fails with [`AnalysisError::UnknownEntity`] when the id is not in the
    /// catalog; nothing external has been called at that point.
    pub fn resolve(&self, key: &EntityKey) -> Result<(String, TemplateVariables), AnalysisError> {
        let date = self
            .date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let unknown = || AnalysisError::UnknownEntity(key.clone());

        match key.kind {
            EntityKind::National if key.id == NATIONAL_ID => Ok((
                NATIONAL_LABEL.to_string(),
                national_variables(&self.catalog, date),
            )),
            EntityKind::National => Err(unknown()),
            EntityKind::Regional => {
                let prefecture = self.catalog.prefecture(&key.id).ok_or_else(unknown)?;
                Ok((
                    prefecture.name.clone(),
                    regional_variables(&self.catalog, prefecture, date),
                ))
            }
            EntityKind::Block => {
                let block = self.catalog.block(&key.id).ok_or_else(unknown)?;
                Ok((block.name.clone(), block_variables(&self.catalog, block, date)))
            }
        }
    }

    pub async fn analyze(&self, key: &EntityKey) -> Result<EntityAnalysis, AnalysisError> {
        let (name, mut variables) = self.resolve(key)?;
        let templates = TemplateSet::for_kind(key.kind);

        let search_prompt = render_template(templates.search, &variables);
        let sentiment_prompt = render_template(templates.sentiment, &variables);

        debug!(entity = %key, "search and sentiment stages");
        let (search, sentiment) = tokio::try_join!(
            async {
                self.clients
                    .search
                    .search(&search_prompt)
                    .await
                    .map_err(|e| AnalysisError::from_stage(Stage::Search, e))
            },
            async {
                self.clients
                    .sentiment
                    .analyze(&sentiment_prompt, self.auxiliary_tool)
                    .await
                    .map_err(|e| AnalysisError::from_stage(Stage::Sentiment, e))
            },
        )?;

        // Only the body text goes into the extraction prompt, not citations.
        variables.set(SEARCH_REPORT, search.content.as_str());
        variables.set(SENTIMENT_REPORT, sentiment.content.as_str());
        let extraction_prompt = render_template(templates.extraction, &variables);

        debug!(entity = %key, "extraction stage");
        let schema = self.schemas.get(key.kind);
        let forecast = self
            .clients
            .extraction
            .extract(&extraction_prompt, schema)
            .await
            .map_err(|e| AnalysisError::from_stage(Stage::Extraction, e))?;

        if forecast.kind() != key.kind {
            return Err(AnalysisError::SchemaViolation(format!(
                "expected a {} forecast, got {}",
                key.kind,
                forecast.kind()
            )));
        }
        self.check_consistency(key, &forecast);

        Ok(EntityAnalysis {
            key: key.clone(),
            name,
            search,
            sentiment,
            forecast,
            api_calls: CALLS_PER_ENTITY,
        })
    }

    /// Log forecasts that validate but disagree with the reference tables.
    fn check_consistency(&self, key: &EntityKey, forecast: &Forecast) {
        match forecast {
            Forecast::Block(block) => {
                let Some(reference) = self.catalog.block(&key.id) else {
                    return;
                };
                let allocated = block.allocated_seats();
                if (allocated - f64::from(reference.seats)).abs() > SEAT_TOLERANCE {
                    warn!(
                        entity = %key,
                        allocated,
                        seats = reference.seats,
                        "block forecast seats do not sum to the block total"
                    );
                }
            }
            Forecast::Regional(regional) => {
                let Some(reference) = self.catalog.prefecture(&key.id) else {
                    return;
                };
                if regional.districts.len() != reference.district_count as usize {
                    warn!(
                        entity = %key,
                        predicted = regional.districts.len(),
                        expected = reference.district_count,
                        "regional forecast district count differs from reference"
                    );
                }
            }
            Forecast::National(_) => {}
        }
    }
}
