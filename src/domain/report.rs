//! Helpers over the model's answer: marker-tag stripping and change tallies.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

static MARKER_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<\|\|_html.*?\|\|>").expect("marker tag pattern is valid"));

/// Removes runtime marker tags such as `<||_html:<b>||>` from free text.
pub fn strip_marker_tags(text: &str) -> String {
    MARKER_TAG.replace_all(text, "").into_owned()
}

/// One entry of `result.changes`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub field: String,
    pub breaking: bool,
    /// Anything else the model attached (descriptions, severities...).
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl ChangeRecord {
    /// Identity used when comparing reports: (`type`, `field`, `breaking`).
    pub fn same_change(&self, other: &ChangeRecord) -> bool {
        self.kind == other.kind && self.field == other.field && self.breaking == other.breaking
    }
}

/// Number of `changes` entries whose `breaking` flag is `true`.
///
/// Entries without a boolean `breaking` flag do not count.
pub fn count_breaking(result: &JsonValue) -> u64 {
    result
        .get("changes")
        .and_then(JsonValue::as_array)
        .map(|changes| {
            changes
                .iter()
                .filter(|c| c.get("breaking").and_then(JsonValue::as_bool).unwrap_or(false))
                .count() as u64
        })
        .unwrap_or(0)
}

/// Typed view over the breaking entries of `result.changes`; entries that do
/// not carry `type`/`field`/`breaking` are skipped.
pub fn breaking_changes(result: &JsonValue) -> Vec<ChangeRecord> {
    result
        .get("changes")
        .and_then(JsonValue::as_array)
        .map(|changes| {
            changes
                .iter()
                .filter_map(|c| serde_json::from_value::<ChangeRecord>(c.clone()).ok())
                .filter(|c| c.breaking)
                .collect()
        })
        .unwrap_or_default()
}
