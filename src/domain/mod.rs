//! Domain types: the model contract, the expected-output schema and answer helpers.

pub mod expected_schema;
pub mod gateway;
pub mod report;

pub use expected_schema::{ExpectedSchema, SchemaStoreError};
pub use gateway::{Generation, GatewayError, ModelDescriptor, ModelGateway, ModelSettings};
pub use report::{breaking_changes, count_breaking, strip_marker_tags, ChangeRecord};
