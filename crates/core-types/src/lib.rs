//! Shared plan primitives for the plan operator crates.
//!
//! A [`Plan`] is an ordered list of [`Step`] records produced once by the
//! deserializer and read-only afterwards.

mod lenient;
pub mod parser;
pub mod plan;

pub use parser::{parse_plan, strip_code_fence, PlanFormatError};
pub use plan::{Plan, Step, StepAction, DEFAULT_WAIT_SECS};
