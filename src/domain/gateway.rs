//! Contract for the language-model runtime that performs the actual comparison.
//!
//! The runtime is an external collaborator: it owns tokenization, sampling and
//! grammar-constrained decoding. This crate only depends on the `ModelGateway`
//! trait, so the HTTP layer and tests can run against any implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use std::path::PathBuf;

/// Load-time configuration of the model (not per-request).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    pub model_file: PathBuf,
    pub context_length: u32,
    pub gpu_layers: Option<u32>,
}

/// Facts captured once, when the model became ready.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub model_path: String,
    pub size_bytes: u64,
    pub load_time_secs: f64,
    pub context_length: u32,
    pub accelerated_layers: Option<u32>,
    pub loaded_at: DateTime<Utc>,
}

/// Result of a single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// Free text exactly as produced by the runtime.
    pub raw_text: String,
    /// Structured value decoded under the output schema.
    pub structured: JsonValue,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("model runtime request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model runtime returned HTTP {status}: {body}")]
    Runtime { status: u16, body: String },

    #[error("model output is not valid JSON: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    #[error("generation hit the token limit ({tokens} tokens) before the output was complete")]
    Truncated { tokens: u64 },

    #[error("model runtime is not ready: {0}")]
    NotReady(String),
}

/// A loaded language model able to answer a prompt under a JSON Schema.
///
/// Implementations must either return a `structured` value produced under
/// `output_schema` or fail the whole call. No retries happen behind this trait.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Load-time facts about the model behind this gateway.
    fn descriptor(&self) -> &ModelDescriptor;

    /// Runs one generation. May block for a model-dependent duration.
    async fn generate(
        &self,
        prompt: &str,
        output_schema: &JsonValue,
    ) -> Result<Generation, GatewayError>;

    /// Cheap liveness check of the runtime.
    async fn health(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}
