//! Completion error types

use thiserror::Error;

/// Failures surfaced by a completion request.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Rate limit, server-side fault or network hiccup. Retried with backoff.
    #[error("{model} temporarily unavailable{}: {message}", status_suffix(.status))]
    Transient {
        model: String,
        status: Option<u16>,
        message: String,
    },

    /// The service refused the request (bad request, auth, unknown model, ...).
    #[error("{model} rejected the request ({status}): {message}")]
    Rejected {
        model: String,
        status: u16,
        message: String,
    },

    /// No credential was configured for the completion service.
    #[error("completion service credential is not configured (set OPENAI_API_KEY)")]
    MissingCredential,

    /// The service answered but the payload had no usable text.
    #[error("{model} returned an unusable response: {message}")]
    InvalidResponse { model: String, message: String },

    /// The caller cancelled while the client was between attempts.
    #[error("completion request cancelled")]
    Cancelled,

    /// The HTTP client could not be built or the request could not be encoded.
    #[error("http client error: {0}")]
    Client(#[source] reqwest::Error),
}

impl CompletionError {
    pub fn transient(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient {
            model: model.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn rejected(model: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            model: model.into(),
            status,
            message: message.into(),
        }
    }

    /// Whether the failure belongs to the retryable class.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" ({code})")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(CompletionError::transient("m", "rate limited").is_transient());
        assert!(!CompletionError::rejected("m", 401, "bad key").is_transient());
        assert!(!CompletionError::MissingCredential.is_transient());
        assert!(!CompletionError::Cancelled.is_transient());
    }

    #[test]
    fn transient_display_includes_status_when_known() {
        let err = CompletionError::Transient {
            model: "gpt-4o-mini".into(),
            status: Some(429),
            message: "slow down".into(),
        };
        assert_eq!(
            err.to_string(),
            "gpt-4o-mini temporarily unavailable (429): slow down"
        );
        assert_eq!(
            CompletionError::transient("m", "reset").to_string(),
            "m temporarily unavailable: reset"
        );
    }
}
