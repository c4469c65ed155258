//! Plan operator library
//!
//! Exposes configuration and run wiring for the `operator` binary and for
//! integration testing.

pub mod config;
pub mod errors;
pub mod workflow;

// Re-export commonly used types for external use
pub use config::OperatorConfig;
pub use errors::{OperatorError, OperatorResult};
pub use workflow::{execute_plan, load_plan_file, persist_plan};
