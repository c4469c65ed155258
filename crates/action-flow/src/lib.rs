//! Plan Execution Layer
//!
//! Runs a deserialized plan against one automation surface, strictly in step
//! order. Every step is captured for debugging whatever its outcome, step
//! failures are recorded rather than raised, and the surface is closed once
//! when the run ends.

pub mod errors;
pub mod executor;
pub mod types;

pub use errors::FlowError;
pub use executor::PlanExecutor;
pub use types::{ExecutionSummary, StepOutcome, StepRecord};
