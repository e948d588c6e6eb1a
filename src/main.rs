//! One-shot comparison of two schema files.
//!
//! Usage: `graphql-schema-diff [schema1.graphql] [schema2.graphql]`
//! (defaults: `data/schema1.graphql`, `data/schema2.graphql`).

use anyhow::Context;
use graphql_schema_diff::infra::telemetry;
use graphql_schema_diff::{ComparatorSlot, ComparisonOutcome, Config};
use tracing::info;

const DEFAULT_SCHEMA1: &str = "data/schema1.graphql";
const DEFAULT_SCHEMA2: &str = "data/schema2.graphql";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let mut args = std::env::args().skip(1);
    let schema1_path = args.next().unwrap_or_else(|| DEFAULT_SCHEMA1.to_string());
    let schema2_path = args.next().unwrap_or_else(|| DEFAULT_SCHEMA2.to_string());

    let schema1 = std::fs::read_to_string(&schema1_path)
        .with_context(|| format!("Failed to read {}", schema1_path))?;
    let schema2 = std::fs::read_to_string(&schema2_path)
        .with_context(|| format!("Failed to read {}", schema2_path))?;

    let config = Config::from_env()?;
    let comparator = ComparatorSlot::new().get_or_bootstrap(&config).await?;
    info!("Model Information: {:?}", comparator.model_info());

    let outcome = comparator.compare(&schema1, &schema2).await;
    match &outcome {
        ComparisonOutcome::Success { result } => {
            info!("Comparison Result: {}", serde_json::to_string_pretty(result)?);
        }
        ComparisonOutcome::Failure { message } => {
            info!("Comparison failed: {}", message);
        }
    }

    info!("Statistics: {:?}", comparator.statistics().await);

    if outcome.is_success() {
        Ok(())
    } else {
        anyhow::bail!("comparison of {} and {} failed", schema1_path, schema2_path)
    }
}
