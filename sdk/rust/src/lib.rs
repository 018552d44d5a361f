pub mod client;

pub use client::{GateClient, HealthSnapshot, SchemaResponse, TestResult};
