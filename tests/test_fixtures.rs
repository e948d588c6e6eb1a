//! Runs the canned schema pairs under `data/test*` through the comparator.
//!
//! The scripted runs check the harness and the post-processing path; the
//! `live_model_matches_fixtures` test needs a real model (see `.env.example`):
//!
//!   cargo test --test test_fixtures -- --ignored --nocapture

mod common;

use common::{comparator, data_dir, ScriptedGateway};
use graphql_schema_diff::app::fixtures::Fixture;
use graphql_schema_diff::{ComparatorSlot, ComparisonOutcome, Config};
use serde_json::json;

fn fixtures() -> Vec<Fixture> {
    Fixture::discover(data_dir()).expect("fixtures load")
}

/// A model that answers every fixture with its expected result.
fn oracle(fixtures: Vec<Fixture>) -> ScriptedGateway {
    ScriptedGateway::new(move |prompt| {
        let fixture = fixtures
            .iter()
            .find(|f| prompt.contains(f.schema1.as_str()) && prompt.contains(f.schema2.as_str()))
            .expect("prompt embeds a known fixture");
        Ok(fixture.expected.clone())
    })
}

#[test]
fn canned_fixtures_are_discovered_in_order() {
    let names: Vec<String> = fixtures().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["test1", "test2", "test3", "test4"]);
}

#[tokio::test]
async fn oracle_answers_match_every_fixture() {
    let fixtures = fixtures();
    let svc = comparator(oracle(fixtures.clone()));

    let mut expected_breaking = 0;
    for fixture in &fixtures {
        let result = match svc.compare(&fixture.schema1, &fixture.schema2).await {
            ComparisonOutcome::Success { result } => result,
            ComparisonOutcome::Failure { message } => {
                panic!("{}: comparison did not succeed: {}", fixture.name, message)
            }
        };
        let report = fixture.evaluate(&result);
        assert!(report.is_match(), "{}: {}", fixture.name, report);
        expected_breaking += graphql_schema_diff::domain::count_breaking(&fixture.expected);
    }

    let stats = svc.statistics().await;
    assert_eq!(stats.total_api_calls, fixtures.len() as u64);
    assert_eq!(stats.breaking_changes, expected_breaking);
}

#[tokio::test]
async fn missed_breaking_change_is_reported() {
    let fixture = Fixture::load(data_dir().join("test3")).unwrap();
    // Reports the price change but misses the removed type and invents another.
    let svc = comparator(ScriptedGateway::answering(json!({ "changes": [
        { "type": "FIELD_TYPE_CHANGED", "field": "Product.price", "breaking": true },
        { "type": "FIELD_REMOVED", "field": "Product.sku", "breaking": true }
    ]})));

    let outcome = svc.compare(&fixture.schema1, &fixture.schema2).await;
    let ComparisonOutcome::Success { result } = outcome else {
        panic!("comparison should succeed");
    };
    let report = fixture.evaluate(&result);
    assert!(!report.is_match());
    assert_eq!(report.unmatched_expected.len(), 1);
    assert_eq!(report.unmatched_expected[0].field, "Review");
    assert_eq!(report.unexpected_actual.len(), 1);
    assert_eq!(report.unexpected_actual[0].field, "Product.sku");
}

#[tokio::test]
#[ignore = "requires a local GGUF model and llama-server"]
async fn live_model_matches_fixtures() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let svc = ComparatorSlot::new().get_or_bootstrap(&config).await?;

    let mut failures = Vec::new();
    for fixture in fixtures() {
        match svc.compare(&fixture.schema1, &fixture.schema2).await {
            ComparisonOutcome::Success { result } => {
                let report = fixture.evaluate(&result);
                if report.is_match() {
                    println!("Comparison for {} passed.", fixture.name);
                } else {
                    println!("Actual result:\n{}", serde_json::to_string_pretty(&result)?);
                    failures.push(format!("{}: {}", fixture.name, report));
                }
            }
            ComparisonOutcome::Failure { message } => {
                failures.push(format!("{}: {}", fixture.name, message))
            }
        }
    }

    assert!(failures.is_empty(), "fixture mismatches:\n{}", failures.join("\n"));
    Ok(())
}
