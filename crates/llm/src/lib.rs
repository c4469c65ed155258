//! Completion layer for the plan operator.
//!
//! [`ResilientCompletionClient`] wraps a [`CompletionTransport`] with
//! jittered exponential backoff on transient failures and a single request to
//! a fallback model once the primary model's retries are exhausted.

pub mod client;
pub mod errors;
pub mod openai;
pub mod planner;
pub mod retry;
pub mod transport;

pub use client::ResilientCompletionClient;
pub use errors::CompletionError;
pub use openai::{OpenAiConfig, OpenAiTransport};
pub use planner::{build_plan_prompt, PlanGenerator};
pub use retry::RetryPolicy;
pub use transport::CompletionTransport;

pub const DEFAULT_PRIMARY_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_FALLBACK_MODEL: &str = "gpt-3.5-turbo";
