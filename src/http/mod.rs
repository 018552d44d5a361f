//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! bearer-authenticated request
//!     → server.rs (Axum setup, middleware, request ID)
//!     → auth.rs (bearer token check)
//!     → handlers.rs (schema / test / save / health / acquire / outcome)
//!     → workflow, breaker, aggregator
//! ```

pub mod auth;
pub mod handlers;
pub mod server;

pub use server::{ApiServer, AppState};
