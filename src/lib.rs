pub mod app;
pub mod domain;
pub mod infra;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::comparator_service::{ComparatorService, ComparatorSlot, ComparisonOutcome};
pub use domain::{ExpectedSchema, Generation, GatewayError, ModelDescriptor, ModelGateway};
pub use infra::config::Config;
pub use infra::llama::LlamaServerGateway;
