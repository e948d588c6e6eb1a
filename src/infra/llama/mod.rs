pub mod client;

pub use client::LlamaServerGateway;
