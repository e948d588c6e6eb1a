//! Centralized configuration (environment variables + defaults).

use anyhow::Context;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL_FILE: &str = "models/mixtral-8x7b-instruct-v0.1.Q4_K_M.gguf";
pub const DEFAULT_EXPECTED_JSON_PATH: &str = "data/expected.json";
pub const DEFAULT_CONTEXT_LENGTH: u32 = 2048;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_LLAMA_SERVER_BIN: &str = "llama-server";
pub const DEFAULT_LLAMA_SERVER_PORT: u16 = 8089;
pub const DEFAULT_MODEL_LOAD_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// How the llama.cpp runtime that hosts the model is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Attach to an already running `llama-server` instead of spawning one.
    pub server_url: Option<String>,
    pub server_bin: String,
    pub server_port: u16,
    pub load_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub model_file: PathBuf,
    pub expected_json_path: PathBuf,
    pub context_length: u32,
    /// Number of layers offloaded to the accelerator (`None` leaves the runtime default).
    pub gpu_layers: Option<u32>,
    pub max_tokens: u32,
    pub generation_timeout: Duration,
    pub runtime: RuntimeConfig,
    pub bind_addr: String,
}

impl Config {
    /// Reads configuration from the process environment (after loading `.env`, if present).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            model_file: get("MODEL_FILE")
                .unwrap_or_else(|| DEFAULT_MODEL_FILE.to_string())
                .into(),
            expected_json_path: get("EXPECTED_JSON_PATH")
                .unwrap_or_else(|| DEFAULT_EXPECTED_JSON_PATH.to_string())
                .into(),
            context_length: parse_or(
                "MODEL_CONTEXT_LENGTH",
                get("MODEL_CONTEXT_LENGTH"),
                DEFAULT_CONTEXT_LENGTH,
            )?,
            gpu_layers: get("MODEL_GPU_LAYERS")
                .map(|v| parse_value::<u32>("MODEL_GPU_LAYERS", &v))
                .transpose()?,
            max_tokens: parse_or(
                "GENERATION_MAX_TOKENS",
                get("GENERATION_MAX_TOKENS"),
                DEFAULT_MAX_TOKENS,
            )?
            .max(1),
            generation_timeout: Duration::from_secs(
                parse_or(
                    "GENERATION_TIMEOUT_SECS",
                    get("GENERATION_TIMEOUT_SECS"),
                    DEFAULT_GENERATION_TIMEOUT_SECS,
                )?
                .max(1),
            ),
            runtime: RuntimeConfig {
                server_url: get("LLAMA_SERVER_URL").map(|u| u.trim_end_matches('/').to_string()),
                server_bin: get("LLAMA_SERVER_BIN")
                    .unwrap_or_else(|| DEFAULT_LLAMA_SERVER_BIN.to_string()),
                server_port: parse_or(
                    "LLAMA_SERVER_PORT",
                    get("LLAMA_SERVER_PORT"),
                    DEFAULT_LLAMA_SERVER_PORT,
                )?,
                load_timeout: Duration::from_secs(parse_or(
                    "MODEL_LOAD_TIMEOUT_SECS",
                    get("MODEL_LOAD_TIMEOUT_SECS"),
                    DEFAULT_MODEL_LOAD_TIMEOUT_SECS,
                )?),
            },
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim().parse::<T>().with_context(|| {
        format!("{} must be a valid {} (got {:?})", key, std::any::type_name::<T>(), raw)
    })
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.model_file, PathBuf::from(DEFAULT_MODEL_FILE));
        assert_eq!(config.expected_json_path, PathBuf::from(DEFAULT_EXPECTED_JSON_PATH));
        assert_eq!(config.context_length, 2048);
        assert_eq!(config.gpu_layers, None);
        assert_eq!(config.runtime.server_url, None);
        assert_eq!(config.runtime.server_bin, "llama-server");
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.generation_timeout, Duration::from_secs(600));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("MODEL_FILE", "/models/tiny.gguf"),
            ("MODEL_CONTEXT_LENGTH", "4096"),
            ("MODEL_GPU_LAYERS", "10"),
            ("GENERATION_TIMEOUT_SECS", "30"),
            ("LLAMA_SERVER_URL", "http://127.0.0.1:8080/"),
        ]))
        .unwrap();
        assert_eq!(config.model_file, PathBuf::from("/models/tiny.gguf"));
        assert_eq!(config.context_length, 4096);
        assert_eq!(config.gpu_layers, Some(10));
        assert_eq!(config.generation_timeout, Duration::from_secs(30));
        assert_eq!(config.runtime.server_url.as_deref(), Some("http://127.0.0.1:8080"));
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let lookup = lookup_from(&[("MODEL_GPU_LAYERS", ""), ("MODEL_FILE", "  ")]);
        let config = Config::from_lookup(lookup).unwrap();
        assert_eq!(config.gpu_layers, None);
        assert_eq!(config.model_file, PathBuf::from(DEFAULT_MODEL_FILE));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err =
            Config::from_lookup(lookup_from(&[("MODEL_CONTEXT_LENGTH", "lots")])).unwrap_err();
        assert!(err.to_string().contains("MODEL_CONTEXT_LENGTH"));
    }
}
