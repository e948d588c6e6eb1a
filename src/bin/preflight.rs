use graphql_schema_diff::domain::ModelSettings;
use graphql_schema_diff::infra::config::Config;
use graphql_schema_diff::infra::telemetry;
use graphql_schema_diff::{ExpectedSchema, LlamaServerGateway, ModelGateway};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--skip-model-load]\n\
         \n\
         Reads env vars (or .env):\n\
           MODEL_FILE, EXPECTED_JSON_PATH, MODEL_CONTEXT_LENGTH, MODEL_GPU_LAYERS,\n\
           LLAMA_SERVER_URL or LLAMA_SERVER_BIN/LLAMA_SERVER_PORT, MODEL_LOAD_TIMEOUT_SECS\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let skip_model_load = args.iter().any(|a| a == "--skip-model-load");

    let config = Config::from_env()?;

    println!("> Preflight:");
    println!("  MODEL_FILE={}", config.model_file.display());
    println!("  EXPECTED_JSON_PATH={}", config.expected_json_path.display());
    println!("  MODEL_CONTEXT_LENGTH={}", config.context_length);
    println!("  MODEL_GPU_LAYERS={:?}", config.gpu_layers);
    match &config.runtime.server_url {
        Some(url) => println!("  LLAMA_SERVER_URL={} (attach)", url),
        None => println!(
            "  LLAMA_SERVER_BIN={} port={} (spawn)",
            config.runtime.server_bin, config.runtime.server_port
        ),
    }

    // Expected schema parses and compiles
    let schema = ExpectedSchema::load(&config.expected_json_path)?;
    let top_level = schema
        .document()
        .get("properties")
        .and_then(|p| p.as_object())
        .map(|p| p.keys().cloned().collect::<Vec<_>>().join(", "))
        .unwrap_or_default();
    println!("  Expected schema compiles (properties: {}).", top_level);

    // Model artifact readable
    let metadata = std::fs::metadata(&config.model_file).map_err(|e| {
        anyhow::anyhow!(
            "Model artifact {} is not readable: {}",
            config.model_file.display(),
            e
        )
    })?;
    let gib = metadata.len() as f64 / (1024.0 * 1024.0 * 1024.0);
    println!("  Model artifact: {} bytes (~{:.2} GiB)", metadata.len(), gib);
    if !config.model_file.extension().is_some_and(|ext| ext == "gguf") {
        eprintln!(
            "  Warning: model artifact does not have a .gguf extension; llama-server may reject it."
        );
    }

    if skip_model_load {
        println!("> Preflight OK (model load skipped).");
        return Ok(());
    }

    // Runtime comes up and answers health checks
    let settings = ModelSettings {
        model_file: config.model_file.clone(),
        context_length: config.context_length,
        gpu_layers: config.gpu_layers,
    };
    let gateway = LlamaServerGateway::load(&settings, &config.runtime, config.max_tokens).await?;
    gateway.health().await?;
    println!(
        "  Runtime ready at {} (load took {:.2}s).",
        gateway.base_url(),
        gateway.descriptor().load_time_secs
    );

    println!("> Preflight OK.");
    Ok(())
}
