use std::sync::Arc;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn, Level};
use crate::config::{Indicator, MetricConfiguration, Operation, RawMetricConfiguration};
use crate::emitter::emit_pipeline;
use crate::introspector::{load_schema, SchemaCache};
use crate::planner::{compile, CompiledPipeline, RESULT_KEY};
use crate::store::{DocumentStore, TemplateRegistry};
use crate::validator::{self, ConfigError};
use super::error::CalculateError;
use super::ratio::{percentage, split_percentage};
use super::settings::EngineSettings;
use super::value::{IndicatorValue, MetricValue, SeriesPoint};

/// Compiles metric configurations and runs them against a document store
///
/// Holds no per-call state: every entry point builds its own schema cache,
/// so one calculator can serve concurrent callers.
pub struct Calculator<R: ?Sized, S: ?Sized> {
    registry: Arc<R>,
    store: Arc<S>,
    settings: EngineSettings,
}

impl<R, S> Calculator<R, S>
where
    R: TemplateRegistry + ?Sized,
    S: DocumentStore + ?Sized,
{
    pub fn new(registry: Arc<R>, store: Arc<S>) -> Self {
        Self {
            registry,
            store,
            settings: EngineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Calculate one metric
    #[instrument(skip(self, config), fields(collection = %config.collection, operation = %config.operation))]
    pub async fn calculate(&self, config: &MetricConfiguration) -> Result<MetricValue, CalculateError> {
        let cache = SchemaCache::new();
        self.calculate_cached(config, &cache).await
    }

    /// Validate a stored configuration, then calculate it
    pub async fn calculate_raw(&self, raw: &RawMetricConfiguration) -> Result<MetricValue, CalculateError> {
        let config = validator::parse_configuration(raw)?;
        self.calculate(&config).await
    }

    /// Calculate a labeled series, one point per configuration, in input order
    ///
    /// A configuration that fails yields `0`; the rest of the series is unaffected.
    #[instrument(skip_all, fields(count = configs.len()))]
    pub async fn calculate_multiple(&self, configs: &[MetricConfiguration]) -> Vec<SeriesPoint> {
        let cache = SchemaCache::new();
        let cache = &cache;

        let points: Vec<SeriesPoint> = stream::iter(configs)
            .map(|config| async move {
                let value = self
                    .calculate_cached(config, cache)
                    .await
                    .unwrap_or_else(|err| {
                        warn!(
                            collection = %config.collection,
                            label = config.display_label(),
                            error = %err,
                            "metric failed, reporting 0"
                        );
                        MetricValue::ZERO
                    });
                SeriesPoint {
                    label: config.display_label().to_string(),
                    value,
                }
            })
            .buffered(self.settings.concurrency())
            .collect()
            .await;

        info!(points = points.len(), schemas = cache.len(), "calculated series");
        points
    }

    /// Calculate a listing of indicators, optionally overriding every date range's bounds
    ///
    /// A failing indicator is reported with value `0` and its error message.
    #[instrument(skip_all, fields(count = indicators.len()))]
    pub async fn calculate_indicators(
        &self,
        indicators: &[Indicator],
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Vec<IndicatorValue> {
        let inverted = range.and_then(|(start, end)| {
            (start > end).then(|| ConfigError::InvertedDateRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            })
        });

        let cache = SchemaCache::new();
        let cache = &cache;
        let inverted = &inverted;

        let values: Vec<IndicatorValue> = stream::iter(indicators)
            .map(|indicator| async move {
                let result = match (inverted, range) {
                    (Some(err), _) => Err(CalculateError::InvalidConfiguration(err.clone())),
                    (None, Some((start, end))) => {
                        let config = indicator.configuration.clone().with_date_bounds(start, end);
                        self.calculate_cached(&config, cache).await
                    }
                    (None, None) => self.calculate_cached(&indicator.configuration, cache).await,
                };

                match result {
                    Ok(value) => IndicatorValue {
                        id: indicator.id.clone(),
                        name: indicator.name.clone(),
                        value,
                        error: None,
                    },
                    Err(err) => {
                        warn!(indicator = %indicator.id, error = %err, "indicator failed, reporting 0");
                        IndicatorValue {
                            id: indicator.id.clone(),
                            name: indicator.name.clone(),
                            value: MetricValue::ZERO,
                            error: Some(err.to_string()),
                        }
                    }
                }
            })
            .buffered(self.settings.concurrency())
            .collect()
            .await;

        let failed = values.iter().filter(|v| v.error.is_some()).count();
        info!(indicators = values.len(), failed, "calculated indicators");
        values
    }

    /// Compile without executing and return the pipeline(s) that would run
    ///
    /// A percentage yields `{"numerator": .., "denominator": ..}`, anything
    /// else `{"collection": .., "pipeline": [..]}`.
    pub async fn explain(&self, config: &MetricConfiguration) -> Result<Value, CalculateError> {
        let cache = SchemaCache::new();
        if config.operation == Operation::Percentage {
            let (numerator, denominator) = split_percentage(config);
            let numerator = self.compile_config(&numerator, &cache).await?;
            let denominator = self.compile_config(&denominator, &cache).await?;
            return Ok(json!({
                "numerator": explain_pipeline(&numerator)?,
                "denominator": explain_pipeline(&denominator)?,
            }));
        }
        let pipeline = self.compile_config(config, &cache).await?;
        explain_pipeline(&pipeline)
    }

    async fn calculate_cached(
        &self,
        config: &MetricConfiguration,
        cache: &SchemaCache,
    ) -> Result<MetricValue, CalculateError> {
        if config.operation == Operation::Percentage {
            let (numerator, denominator) = split_percentage(config);
            let num = self.run(&numerator, cache).await?;
            let den = self.run(&denominator, cache).await?;
            return Ok(percentage(num, den, &config.collection));
        }
        self.run(config, cache).await
    }

    async fn compile_config(
        &self,
        config: &MetricConfiguration,
        cache: &SchemaCache,
    ) -> Result<CompiledPipeline, CalculateError> {
        let schema = load_schema(&*self.registry, cache, &config.collection).await?;
        Ok(compile(config, &schema, self.settings.date_field_locator)?)
    }

    async fn run(
        &self,
        config: &MetricConfiguration,
        cache: &SchemaCache,
    ) -> Result<MetricValue, CalculateError> {
        let pipeline = self.compile_config(config, cache).await?;
        if tracing::enabled!(Level::DEBUG) {
            if let Ok(rendered) = emit_pipeline(&pipeline.stages) {
                debug!(collection = %pipeline.collection, pipeline = %rendered, "executing pipeline");
            }
        }
        self.execute(&pipeline).await
    }

    /// Run a pipeline under the configured deadline and read its result
    async fn execute(&self, pipeline: &CompiledPipeline) -> Result<MetricValue, CalculateError> {
        let fetch = async {
            match self.store.aggregate(&pipeline.collection, &pipeline.stages).await {
                Ok(mut results) => results.try_next().await,
                Err(err) => Err(err),
            }
        };

        let first = tokio::time::timeout(self.settings.query_timeout(), fetch)
            .await
            .map_err(|_| CalculateError::Timeout {
                collection: pipeline.collection.clone(),
                timeout_ms: self.settings.query_timeout_ms,
            })??;

        Ok(first
            .as_ref()
            .and_then(|doc| doc.get(RESULT_KEY))
            .map(MetricValue::from_json)
            .unwrap_or(MetricValue::ZERO))
    }
}

fn explain_pipeline(pipeline: &CompiledPipeline) -> Result<Value, CalculateError> {
    Ok(json!({
        "collection": pipeline.collection,
        "pipeline": emit_pipeline(&pipeline.stages)?,
    }))
}
