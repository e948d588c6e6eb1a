//! Shared helpers for the integration tests: a scripted model gateway and an
//! in-process API server bound to an ephemeral port.

#![allow(dead_code)]

use async_trait::async_trait;
use graphql_schema_diff::{
    ComparatorService, ExpectedSchema, GatewayError, Generation, ModelDescriptor, ModelGateway,
};
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub type Responder = dyn Fn(&str) -> Result<JsonValue, GatewayError> + Send + Sync;

/// Gateway that answers from a closure instead of a real model.
pub struct ScriptedGateway {
    descriptor: ModelDescriptor,
    responder: Box<Responder>,
    pub calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<JsonValue, GatewayError> + Send + Sync + 'static,
    {
        Self {
            descriptor: ModelDescriptor {
                model_path: "models/scripted.gguf".to_string(),
                size_bytes: 4_096,
                load_time_secs: 0.25,
                context_length: 2048,
                accelerated_layers: Some(10),
                loaded_at: chrono::Utc::now(),
            },
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn answering(answer: JsonValue) -> Self {
        Self::new(move |_| Ok(answer.clone()))
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    async fn generate(
        &self,
        prompt: &str,
        _output_schema: &JsonValue,
    ) -> Result<Generation, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let structured = (self.responder)(prompt)?;
        Ok(Generation {
            raw_text: structured.to_string(),
            structured,
        })
    }
}

pub fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

pub fn expected_schema() -> ExpectedSchema {
    ExpectedSchema::load(data_dir().join("expected.json")).expect("data/expected.json loads")
}

pub fn comparator(gateway: ScriptedGateway) -> Arc<ComparatorService> {
    Arc::new(ComparatorService::new(
        Arc::new(gateway),
        expected_schema(),
        Duration::from_secs(10),
    ))
}

/// Serves the API router for `comparator` on 127.0.0.1 and returns its base URL.
pub async fn spawn_api(
    comparator: Arc<ComparatorService>,
) -> (String, tokio::task::JoinHandle<()>) {
    let app_state = graphql_schema_diff::transport::http::AppState { comparator };
    let router = graphql_schema_diff::transport::http::create_router(app_state);

    // Bind to an ephemeral port to avoid conflicts between tests.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://127.0.0.1:{}", port), handle)
}
