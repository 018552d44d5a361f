//! Lifecycle management subsystem.
//!
//! # Design Decisions
//! - Shutdown is a broadcast channel every long-running task subscribes to
//! - SIGINT triggers graceful shutdown; the server drains in-flight requests

pub mod shutdown;

pub use shutdown::Shutdown;
