//! Sequences one schema comparison: prompt → model → validation → counters.

use crate::domain::expected_schema::ExpectedSchema;
use crate::domain::gateway::{GatewayError, ModelGateway, ModelSettings};
use crate::domain::report::{count_breaking, strip_marker_tags};
use crate::infra::config::Config;
use crate::infra::llama::LlamaServerGateway;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::Instant;
use tracing::{debug, error, info};
use utoipa::ToSchema;

const QUESTION: &str =
    "Can you inspect the following graphql schemas and compare them for any breaking changes?";

/// Builds the instruction sent to the model; both schemas are embedded verbatim.
pub fn build_prompt(schema1: &str, schema2: &str) -> String {
    format!("{}: {}, {}\nAnswer: ", QUESTION, schema1, schema2)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonOutcome {
    Success { result: JsonValue },
    Failure { message: String },
}

impl ComparisonOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ComparisonOutcome::Success { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("generation failed: {0}")]
    Generation(#[from] GatewayError),

    #[error("generation timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("model output is not a JSON object")]
    NotAnObject,

    #[error("model output does not match the expected schema: {}", .0.join("; "))]
    NonConforming(Vec<String>),
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct StatisticsSnapshot {
    pub total_api_calls: u64,
    pub breaking_changes: u64,
    /// Seconds.
    pub average_query_time: f64,
    /// Seconds.
    pub total_query_time: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct ModelInfo {
    pub model_path: String,
    /// Seconds spent loading the model.
    pub model_load_time: f64,
    /// Size of the model artifact in bytes.
    pub model_size: u64,
    pub context_length: u32,
    pub accelerated_layers: Option<u32>,
    #[schema(value_type = String, format = DateTime)]
    pub loaded_at: DateTime<Utc>,
}

#[derive(Default)]
struct Counters {
    api_calls: u64,
    breaking_changes: u64,
    query_times: Vec<Duration>,
}

/// Owns the model gateway, the expected schema and the usage counters.
///
/// Generations are serialized: at most one request is in flight against the
/// model at any time, since local runtimes are generally not reentrant.
pub struct ComparatorService {
    gateway: Arc<dyn ModelGateway>,
    expected: ExpectedSchema,
    generation_timeout: Duration,
    generation_slot: Mutex<()>,
    counters: Mutex<Counters>,
}

impl ComparatorService {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        expected: ExpectedSchema,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            expected,
            generation_timeout,
            generation_slot: Mutex::new(()),
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Loads the expected schema and the model runtime described by `config`.
    pub async fn bootstrap(config: &Config) -> anyhow::Result<Self> {
        info!(path = ?config.expected_json_path, "Loading expected output schema");
        let expected = ExpectedSchema::load(&config.expected_json_path)?;

        let settings = ModelSettings {
            model_file: config.model_file.clone(),
            context_length: config.context_length,
            gpu_layers: config.gpu_layers,
        };
        let gateway =
            LlamaServerGateway::load(&settings, &config.runtime, config.max_tokens).await?;

        Ok(Self::new(Arc::new(gateway), expected, config.generation_timeout))
    }

    /// Compares two schemas. Never fails: errors come back as `Failure`,
    /// in which case no counter is touched.
    ///
    /// Recorded latency starts once the generation slot is held, so time spent
    /// queued behind other requests is not counted.
    pub async fn compare(&self, schema1: &str, schema2: &str) -> ComparisonOutcome {
        info!("Comparing provided GraphQL schemas");

        match self.run_comparison(schema1, schema2).await {
            Ok((result, elapsed)) => {
                let breaking = count_breaking(&result);
                {
                    let mut counters = self.counters.lock().await;
                    counters.breaking_changes += breaking;
                    counters.query_times.push(elapsed);
                    counters.api_calls += 1;
                }
                info!(
                    breaking,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "Generated output: {}",
                    serde_json::to_string_pretty(&result).unwrap_or_default()
                );
                ComparisonOutcome::Success { result }
            }
            Err(e) => {
                error!(error = %e, "Error during comparison");
                ComparisonOutcome::Failure { message: e.to_string() }
            }
        }
    }

    async fn run_comparison(
        &self,
        schema1: &str,
        schema2: &str,
    ) -> Result<(JsonValue, Duration), CompareError> {
        let prompt = build_prompt(schema1, schema2);

        let (generation, started) = tokio::time::timeout(self.generation_timeout, async {
            let _slot = self.generation_slot.lock().await;
            let started = Instant::now();
            let generation = self.gateway.generate(&prompt, self.expected.document()).await;
            (generation, started)
        })
        .await
        .map_err(|_| CompareError::TimedOut(self.generation_timeout))?;
        let generation = generation?;

        debug!("Model output: {}", strip_marker_tags(&generation.raw_text));

        let result = generation.structured;
        if !result.is_object() {
            return Err(CompareError::NotAnObject);
        }
        self.expected.validate(&result).map_err(CompareError::NonConforming)?;
        Ok((result, started.elapsed()))
    }

    pub async fn statistics(&self) -> StatisticsSnapshot {
        let counters = self.counters.lock().await;
        let total: f64 = counters.query_times.iter().map(Duration::as_secs_f64).sum();
        let average = if counters.query_times.is_empty() {
            0.0
        } else {
            total / counters.query_times.len() as f64
        };
        StatisticsSnapshot {
            total_api_calls: counters.api_calls,
            breaking_changes: counters.breaking_changes,
            average_query_time: average,
            total_query_time: total,
        }
    }

    pub fn model_info(&self) -> ModelInfo {
        let d = self.gateway.descriptor();
        ModelInfo {
            model_path: d.model_path.clone(),
            model_load_time: d.load_time_secs,
            model_size: d.size_bytes,
            context_length: d.context_length,
            accelerated_layers: d.accelerated_layers,
            loaded_at: d.loaded_at,
        }
    }

    pub async fn runtime_health(&self) -> Result<(), GatewayError> {
        self.gateway.health().await
    }
}

/// Holds the one `ComparatorService` of the process.
///
/// The first successful initialization wins; later calls return the existing
/// instance and never run their initializer, so their configuration is ignored.
#[derive(Default)]
pub struct ComparatorSlot {
    cell: OnceCell<Arc<ComparatorService>>,
}

impl ComparatorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_try_init<F, Fut>(
        &self,
        init: F,
    ) -> anyhow::Result<Arc<ComparatorService>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<ComparatorService>>,
    {
        self.cell
            .get_or_try_init(|| async { init().await.map(Arc::new) })
            .await
            .cloned()
    }

    /// Convenience wrapper around `ComparatorService::bootstrap`.
    pub async fn get_or_bootstrap(
        &self,
        config: &Config,
    ) -> anyhow::Result<Arc<ComparatorService>> {
        self.get_or_try_init(|| ComparatorService::bootstrap(config)).await
    }

    pub fn get(&self) -> Option<Arc<ComparatorService>> {
        self.cell.get().cloned()
    }
}
