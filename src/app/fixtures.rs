//! Canned schema pairs with their expected breaking changes.
//!
//! A fixture directory holds `schema1.graphql`, `schema2.graphql` and
//! `expected_result.json`. Only breaking changes are compared, matched on
//! (`type`, `field`, `breaking`); non-breaking entries are free to differ.

use crate::domain::report::{breaking_changes, ChangeRecord};
use anyhow::Context;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

pub const SCHEMA1_FILE: &str = "schema1.graphql";
pub const SCHEMA2_FILE: &str = "schema2.graphql";
pub const EXPECTED_RESULT_FILE: &str = "expected_result.json";

#[derive(Debug, Clone)]
pub struct Fixture {
    pub name: String,
    pub dir: PathBuf,
    pub schema1: String,
    pub schema2: String,
    pub expected: JsonValue,
}

impl Fixture {
    pub fn load(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let read = |file: &str| {
            let path = dir.join(file);
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))
        };

        let expected_raw = read(EXPECTED_RESULT_FILE)?;
        let expected = serde_json::from_str(&expected_raw).with_context(|| {
            format!("Invalid JSON in {}", dir.join(EXPECTED_RESULT_FILE).display())
        })?;

        Ok(Self {
            name: dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| dir.display().to_string()),
            dir: dir.to_path_buf(),
            schema1: read(SCHEMA1_FILE)?,
            schema2: read(SCHEMA2_FILE)?,
            expected,
        })
    }

    /// Every immediate subdirectory of `root` that contains a fixture, sorted by name.
    pub fn discover(root: impl AsRef<Path>) -> anyhow::Result<Vec<Self>> {
        let root = root.as_ref();
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(root)
            .with_context(|| format!("Failed to list {}", root.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_dir() && p.join(SCHEMA1_FILE).is_file())
            .collect();
        dirs.sort();
        dirs.into_iter().map(Self::load).collect()
    }

    pub fn evaluate(&self, actual: &JsonValue) -> FixtureReport {
        evaluate(actual, &self.expected)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureReport {
    /// Expected breaking changes the model did not report.
    pub unmatched_expected: Vec<ChangeRecord>,
    /// Breaking changes the model reported that were not expected.
    pub unexpected_actual: Vec<ChangeRecord>,
}

impl FixtureReport {
    pub fn is_match(&self) -> bool {
        self.unmatched_expected.is_empty() && self.unexpected_actual.is_empty()
    }
}

impl std::fmt::Display for FixtureReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_match() {
            return write!(f, "all breaking changes matched");
        }
        let render = |changes: &[ChangeRecord]| {
            changes
                .iter()
                .map(|c| format!("{} {}", c.kind, c.field))
                .collect::<Vec<_>>()
                .join(", ")
        };
        if !self.unmatched_expected.is_empty() {
            write!(f, "missing: [{}]", render(&self.unmatched_expected))?;
        }
        if !self.unexpected_actual.is_empty() {
            if !self.unmatched_expected.is_empty() {
                write!(f, "; ")?;
            }
            write!(f, "unexpected: [{}]", render(&self.unexpected_actual))?;
        }
        Ok(())
    }
}

/// Diffs the breaking changes of `actual` against those of `expected`.
pub fn evaluate(actual: &JsonValue, expected: &JsonValue) -> FixtureReport {
    let actual = breaking_changes(actual);
    let expected = breaking_changes(expected);

    let unmatched_expected = expected
        .iter()
        .filter(|e| !actual.iter().any(|a| a.same_change(e)))
        .cloned()
        .collect();
    let unexpected_actual = actual
        .iter()
        .filter(|a| !expected.iter().any(|e| e.same_change(a)))
        .cloned()
        .collect();

    FixtureReport {
        unmatched_expected,
        unexpected_actual,
    }
}
