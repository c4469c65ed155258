use async_trait::async_trait;

use crate::errors::CompletionError;

/// A single prompt/response exchange with a remote completion service.
///
/// Implementations perform exactly one request per call and classify the
/// failure; retrying is the caller's business.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError>;
}
