// Responsible for all communication with the llama.cpp model runtime (`llama-server`).

use crate::domain::gateway::{
    GatewayError, Generation, ModelDescriptor, ModelGateway, ModelSettings,
};
use crate::infra::config::RuntimeConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(500);
// Bounds a single `/health` request; a runtime that accepts but never answers must not
// stall callers.
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// Body of `POST /completion`. `json_schema` turns on grammar-constrained decoding.
#[derive(Serialize, Debug)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    json_schema: &'a JsonValue,
    cache_prompt: bool,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct CompletionResponse {
    content: String,
    #[serde(default)]
    tokens_predicted: u64,
    #[serde(default)]
    stopped_limit: bool,
}

/// Model gateway backed by a `llama-server` process.
///
/// In spawn mode the gateway owns the child process; dropping the gateway
/// kills it, which unloads the model.
pub struct LlamaServerGateway {
    http: reqwest::Client,
    base_url: String,
    max_tokens: u32,
    descriptor: ModelDescriptor,
    _child: Option<Child>,
}

impl LlamaServerGateway {
    /// Loads the model: spawns (or attaches to) the runtime and waits until it reports ready.
    pub async fn load(
        settings: &ModelSettings,
        runtime: &RuntimeConfig,
        max_tokens: u32,
    ) -> anyhow::Result<Self> {
        let metadata = tokio::fs::metadata(&settings.model_file).await.map_err(|e| {
            anyhow::anyhow!("Model artifact {:?} is not readable: {}", settings.model_file, e)
        })?;
        if !metadata.is_file() {
            anyhow::bail!("Model artifact {:?} is not a regular file", settings.model_file);
        }

        // No overall request timeout: generation length is bounded by the comparator's deadline.
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        let started = Instant::now();

        let (base_url, mut child) = match &runtime.server_url {
            Some(url) => {
                info!(url = %url, "Attaching to running llama-server");
                (url.clone(), None)
            }
            None => {
                ensure_port_free(runtime.server_port).await?;
                let child = spawn_server(settings, runtime)?;
                (format!("http://127.0.0.1:{}", runtime.server_port), Some(child))
            }
        };

        wait_until_ready(&http, &base_url, child.as_mut(), runtime.load_timeout).await?;

        let load_time_secs = started.elapsed().as_secs_f64();
        let descriptor = ModelDescriptor {
            model_path: settings.model_file.display().to_string(),
            size_bytes: metadata.len(),
            load_time_secs,
            context_length: settings.context_length,
            accelerated_layers: settings.gpu_layers,
            loaded_at: chrono::Utc::now(),
        };
        info!(
            model = %descriptor.model_path,
            size_bytes = descriptor.size_bytes,
            load_time_secs,
            "Model loaded"
        );

        Ok(Self {
            http,
            base_url,
            max_tokens,
            descriptor,
            _child: child,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// A runtime already listening on the port would answer our readiness checks in
/// place of the child we spawn, with a model we know nothing about.
async fn ensure_port_free(port: u16) -> anyhow::Result<()> {
    match tokio::net::TcpListener::bind(("127.0.0.1", port)).await {
        Ok(listener) => {
            drop(listener);
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!(
            "Port {} is already in use ({}); stop the process holding it or set \
             LLAMA_SERVER_URL to attach",
            port,
            e
        )),
    }
}

fn spawn_server(settings: &ModelSettings, runtime: &RuntimeConfig) -> anyhow::Result<Child> {
    let mut command = Command::new(&runtime.server_bin);
    command
        .arg("--model")
        .arg(&settings.model_file)
        .arg("--ctx-size")
        .arg(settings.context_length.to_string())
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(runtime.server_port.to_string());
    if let Some(layers) = settings.gpu_layers {
        command.arg("--n-gpu-layers").arg(layers.to_string());
    }
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    info!(
        bin = %runtime.server_bin,
        port = runtime.server_port,
        context_length = settings.context_length,
        gpu_layers = ?settings.gpu_layers,
        "Spawning llama-server"
    );
    command
        .spawn()
        .map_err(|e| anyhow::anyhow!("Failed to spawn {}: {}", runtime.server_bin, e))
}

/// Polls `GET /health` until the runtime answers 200 or the deadline passes.
async fn wait_until_ready(
    http: &reqwest::Client,
    base_url: &str,
    mut child: Option<&mut Child>,
    timeout: Duration,
) -> anyhow::Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(child) = child.as_deref_mut() {
            if let Some(status) = child.try_wait()? {
                anyhow::bail!("llama-server exited before becoming ready ({})", status);
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining, check_health(http, base_url)).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => debug!(error = %e, "llama-server not ready yet"),
            Err(_) => debug!("llama-server health check did not answer before the deadline"),
        }

        if Instant::now() >= deadline {
            anyhow::bail!(
                "llama-server at {} did not become ready within {:.1}s",
                base_url,
                timeout.as_secs_f64()
            );
        }
        sleep(READINESS_POLL_INTERVAL).await;
    }
}

async fn check_health(http: &reqwest::Client, base_url: &str) -> Result<(), GatewayError> {
    let response = http
        .get(format!("{}/health", base_url))
        .timeout(HEALTH_CHECK_TIMEOUT)
        .send()
        .await?;
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::NotReady(format!("HTTP {}: {}", status.as_u16(), body)))
    }
}

#[async_trait]
impl ModelGateway for LlamaServerGateway {
    fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    async fn generate(
        &self,
        prompt: &str,
        output_schema: &JsonValue,
    ) -> Result<Generation, GatewayError> {
        let request = CompletionRequest {
            prompt,
            n_predict: self.max_tokens,
            json_schema: output_schema,
            cache_prompt: true,
            stream: false,
        };
        let response = self
            .http
            .post(format!("{}/completion", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Runtime {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        debug!(tokens = completion.tokens_predicted, "Completion received");

        let structured = match serde_json::from_str::<JsonValue>(&completion.content) {
            Ok(value) => value,
            Err(_) if completion.stopped_limit => {
                warn!(tokens = completion.tokens_predicted, "Completion hit the token limit");
                return Err(GatewayError::Truncated {
                    tokens: completion.tokens_predicted,
                });
            }
            Err(e) => return Err(GatewayError::MalformedOutput(e)),
        };

        Ok(Generation {
            raw_text: completion.content,
            structured,
        })
    }

    async fn health(&self) -> Result<(), GatewayError> {
        check_health(&self.http, &self.base_url).await
    }
}
