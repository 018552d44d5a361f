//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GateConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::GateConfig;
pub use schema::ListenerConfig;
pub use schema::SlotConfig;

use std::collections::HashMap;

/// Runtime index of the configured provider slots.
///
/// Built once from the validated config; preserves declaration order for
/// listing endpoints while allowing O(1) lookup by slot name.
#[derive(Debug, Clone)]
pub struct SlotTable {
    order: Vec<String>,
    by_name: HashMap<String, SlotConfig>,
}

impl SlotTable {
    pub fn from_config(slots: &[SlotConfig]) -> Self {
        let order = slots.iter().map(|s| s.name.clone()).collect();
        let by_name = slots.iter().map(|s| (s.name.clone(), s.clone())).collect();
        Self { order, by_name }
    }

    pub fn get(&self, name: &str) -> Option<&SlotConfig> {
        self.by_name.get(name)
    }

    /// Slots in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &SlotConfig> {
        self.order.iter().filter_map(|n| self.by_name.get(n))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
