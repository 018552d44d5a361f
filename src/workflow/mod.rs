//! Provider test/activate workflow.
//!
//! # Data Flow
//! ```text
//! test(draft):  draft → probe (live connectivity) → report; nothing persisted
//! test():       active config → breaker probe slot → probe → outcome recorded
//! save(draft):  draft → form engine → store (persist) → breaker reset (activate)
//! ```
//!
//! # Design Decisions
//! - Test and Save are mutually exclusive per slot; the phase is an enum,
//!   so "testing and saving simultaneously" cannot be represented
//! - Testing never persists; operators verify credentials before committing
//!   a configuration into rotation
//! - A failed save leaves the previous configuration and the draft intact

pub mod activate;
pub mod probe;
pub mod store;

pub use activate::{ActivationWorkflow, Phase, TestReport, WorkflowError};
pub use probe::{HttpProbe, ProbeError, ProviderProbe};
pub use store::{ConfigStore, HttpStore, MemoryStore, StoreError};
