//! The expected-output JSON Schema handed to the model on every call.

use jsonschema::JSONSchema;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SchemaStoreError {
    #[error("failed to read expected schema {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("expected schema {path:?} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected schema must be a JSON object")]
    NotAnObject,

    #[error("expected schema does not compile: {0}")]
    Invalid(String),
}

/// Immutable, compiled JSON Schema. Loaded once, never reloaded.
pub struct ExpectedSchema {
    document: JsonValue,
    compiled: JSONSchema,
}

impl std::fmt::Debug for ExpectedSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpectedSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl ExpectedSchema {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaStoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SchemaStoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: JsonValue =
            serde_json::from_str(&content).map_err(|source| SchemaStoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_value(document)
    }

    pub fn from_value(document: JsonValue) -> Result<Self, SchemaStoreError> {
        if !document.is_object() {
            return Err(SchemaStoreError::NotAnObject);
        }
        let compiled = JSONSchema::compile(&document)
            .map_err(|e| SchemaStoreError::Invalid(e.to_string()))?;
        Ok(Self { document, compiled })
    }

    /// The raw schema document (what the runtime receives).
    pub fn document(&self) -> &JsonValue {
        &self.document
    }

    /// Returns every violation of `instance` against the schema.
    pub fn validate(&self, instance: &JsonValue) -> Result<(), Vec<String>> {
        self.compiled
            .validate(instance)
            .map_err(|errors| errors.map(|e| format!("{} (at {})", e, e.instance_path)).collect())
    }
}
