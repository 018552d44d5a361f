//! Schema-driven configuration form engine.
//!
//! # Data Flow
//! ```text
//! ProviderSchema + ConfigDraft (raw user input)
//!     → engine.rs (per-field validation, exhaustive on FieldType)
//!     → validated draft (schema keys only)  |  Vec<ValidationError>
//! ```
//!
//! # Design Decisions
//! - Validation is pure: no persistence, no I/O
//! - All field errors are returned together, not just the first
//! - An empty or absent schema means "no configuration needed", not an error

pub mod engine;

pub use engine::{render_plan, validate, ConfigDraft, RenderedField, ValidationError};
