//! Provider field schemas.
//!
//! # Data Flow
//! ```text
//! Built-in catalog + config-declared schemas
//!     → catalog.rs (merge, lookup by provider type)
//!     → form engine (rendering order + validation rules)
//!     → dashboard UI (GET /api/schemas/{provider_type})
//! ```
//!
//! # Design Decisions
//! - A schema is data only; it carries no behavior
//! - Field types are a closed enum, matched exhaustively
//! - Schemas are immutable once the catalog is built

pub mod catalog;
pub mod field;

pub use catalog::SchemaCatalog;
pub use field::{FieldDescriptor, FieldType, ProviderSchema, SelectOption};
