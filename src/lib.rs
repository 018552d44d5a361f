//! Provider Resilience Core
//!
//! Schema-driven provider configuration and circuit-breaker health tracking
//! for a call-center platform, exposed as an HTTP service to the dashboard
//! UI and the call-routing path.

pub mod breaker;
pub mod config;
pub mod form;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod schema;
pub mod workflow;

pub use config::schema::GateConfig;
pub use http::ApiServer;
pub use lifecycle::Shutdown;
