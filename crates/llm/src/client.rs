use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::errors::CompletionError;
use crate::retry::RetryPolicy;
use crate::transport::CompletionTransport;
use crate::{DEFAULT_FALLBACK_MODEL, DEFAULT_PRIMARY_MODEL};

/// Completion client that retries the primary model and then falls back.
///
/// Transient failures of the primary model are retried per [`RetryPolicy`].
/// Any other failure is returned immediately. Once the primary model has
/// failed transiently on every attempt, exactly one request goes to the
/// fallback model and its result is returned as is.
pub struct ResilientCompletionClient {
    transport: Arc<dyn CompletionTransport>,
    primary_model: String,
    fallback_model: String,
    policy: RetryPolicy,
    cancel: Option<CancellationToken>,
}

impl ResilientCompletionClient {
    pub fn new(transport: Arc<dyn CompletionTransport>) -> Self {
        Self {
            transport,
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            fallback_model: DEFAULT_FALLBACK_MODEL.to_string(),
            policy: RetryPolicy::default(),
            cancel: None,
        }
    }

    pub fn with_models(
        mut self,
        primary: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Self {
        self.primary_model = primary.into();
        self.fallback_model = fallback.into();
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Checked before every attempt and while backing off, never mid-request.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn primary_model(&self) -> &str {
        &self.primary_model
    }

    pub fn fallback_model(&self) -> &str {
        &self.fallback_model
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends `prompt` and returns the raw text of the first successful response.
    pub async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let attempts = self.policy.primary_attempts();
        for attempt in 1..=attempts {
            self.ensure_active()?;
            info!(
                target: "completion",
                attempt,
                attempts,
                model = %self.primary_model,
                "Requesting completion"
            );

            let err = match self.transport.complete(&self.primary_model, prompt).await {
                Ok(text) => return Ok(text),
                Err(err) => err,
            };

            if !err.is_transient() {
                error!(
                    target: "completion",
                    attempt,
                    model = %self.primary_model,
                    error = %err,
                    "Completion failed with a non-retryable error"
                );
                return Err(err);
            }

            if attempt == attempts {
                warn!(
                    target: "completion",
                    attempt,
                    attempts,
                    model = %self.primary_model,
                    error = %err,
                    "Completion failed on final attempt"
                );
                break;
            }

            let wait = self.policy.backoff(attempt);
            warn!(
                target: "completion",
                attempt,
                attempts,
                model = %self.primary_model,
                error = %err,
                wait_secs = wait.as_secs_f64(),
                "Transient completion failure; backing off"
            );
            self.pause(wait).await?;
        }

        self.ensure_active()?;
        warn!(
            target: "completion",
            primary = %self.primary_model,
            fallback = %self.fallback_model,
            "All retries failed; falling back"
        );
        info!(
            target: "completion",
            attempt = attempts + 1,
            model = %self.fallback_model,
            "Requesting completion"
        );
        let result = self.transport.complete(&self.fallback_model, prompt).await;
        if let Err(err) = &result {
            error!(
                target: "completion",
                model = %self.fallback_model,
                error = %err,
                "Fallback completion failed"
            );
        }
        result
    }

    fn ensure_active(&self) -> Result<(), CompletionError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(CompletionError::Cancelled),
            _ => Ok(()),
        }
    }

    async fn pause(&self, wait: Duration) -> Result<(), CompletionError> {
        match &self.cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(CompletionError::Cancelled),
                _ = tokio::time::sleep(wait) => Ok(()),
            },
            None => {
                tokio::time::sleep(wait).await;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays scripted results per model and records every call.
    #[derive(Default)]
    struct ScriptedTransport {
        primary: Mutex<VecDeque<Result<String, CompletionError>>>,
        fallback: Mutex<VecDeque<Result<String, CompletionError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(
            primary: Vec<Result<String, CompletionError>>,
            fallback: Vec<Result<String, CompletionError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                primary: Mutex::new(primary.into()),
                fallback: Mutex::new(fallback.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionTransport for ScriptedTransport {
        async fn complete(&self, model: &str, _prompt: &str) -> Result<String, CompletionError> {
            self.calls.lock().unwrap().push(model.to_string());
            let queue = if model == "primary" {
                &self.primary
            } else {
                &self.fallback
            };
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CompletionError::transient(model, "script exhausted")))
        }
    }

    fn transient(model: &str) -> Result<String, CompletionError> {
        Err(CompletionError::transient(model, "rate limited"))
    }

    fn client(transport: Arc<ScriptedTransport>, retries: u32) -> ResilientCompletionClient {
        ResilientCompletionClient::new(transport)
            .with_models("primary", "fallback")
            .with_policy(RetryPolicy {
                retries,
                ..RetryPolicy::default()
            })
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_is_returned_without_backoff() {
        let transport = ScriptedTransport::new(vec![Ok("plan".into())], vec![]);
        let started = Instant::now();
        let text = client(transport.clone(), 3)
            .complete("prompt")
            .await
            .expect("text");
        assert_eq!(text, "plan");
        assert_eq!(transport.calls(), vec!["primary"]);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn primary_recovering_on_last_retry_never_touches_fallback() {
        let transport = ScriptedTransport::new(
            vec![
                transient("primary"),
                transient("primary"),
                transient("primary"),
                Ok("late success".into()),
            ],
            vec![Ok("fallback text".into())],
        );
        let text = client(transport.clone(), 3)
            .complete("prompt")
            .await
            .expect("text");
        assert_eq!(text, "late success");
        assert_eq!(transport.calls(), vec!["primary"; 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_primary_falls_back_exactly_once() {
        let transport = ScriptedTransport::new(
            (0..4).map(|_| transient("primary")).collect(),
            vec![Ok("fallback text".into())],
        );
        let text = client(transport.clone(), 3)
            .complete("prompt")
            .await
            .expect("text");
        assert_eq!(text, "fallback text");
        let calls = transport.calls();
        assert_eq!(calls.iter().filter(|m| *m == "primary").count(), 4);
        assert_eq!(calls.iter().filter(|m| *m == "fallback").count(), 1);
        assert_eq!(calls.last().map(String::as_str), Some("fallback"));
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_failure_propagates_verbatim_and_is_not_retried() {
        let transport = ScriptedTransport::new(
            vec![transient("primary"), transient("primary")],
            vec![
                Err(CompletionError::rejected("fallback", 404, "no such model")),
                Ok("never".into()),
            ],
        );
        let err = client(transport.clone(), 1)
            .complete("prompt")
            .await
            .expect_err("fallback fails");
        assert!(matches!(
            err,
            CompletionError::Rejected { ref model, status: 404, .. } if model == "fallback"
        ));
        assert_eq!(transport.calls(), vec!["primary", "primary", "fallback"]);
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_errors_are_not_retried() {
        let transport = ScriptedTransport::new(
            vec![Err(CompletionError::rejected("primary", 401, "bad key"))],
            vec![Ok("fallback text".into())],
        );
        let err = client(transport.clone(), 3)
            .complete("prompt")
            .await
            .expect_err("fatal");
        assert!(matches!(err, CompletionError::Rejected { status: 401, .. }));
        assert_eq!(transport.calls(), vec!["primary"]);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_waits_within_jitter_window() {
        let transport = ScriptedTransport::new(
            vec![transient("primary"), transient("primary"), Ok("ok".into())],
            vec![],
        );
        let started = Instant::now();
        client(transport, 3).complete("prompt").await.expect("text");
        // Retries 1 and 2: 1.5s + 2.25s, each with up to 0.5s jitter.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs_f64(3.75), "{elapsed:?}");
        assert!(elapsed <= Duration::from_secs_f64(4.75), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_stops_before_first_attempt() {
        let transport = ScriptedTransport::new(vec![transient("primary")], vec![]);
        let token = CancellationToken::new();
        let client = client(transport.clone(), 3).with_cancellation(token.clone());
        token.cancel();
        let err = client.complete("prompt").await.expect_err("cancelled");
        assert!(matches!(err, CompletionError::Cancelled));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let transport =
            ScriptedTransport::new(vec![transient("primary"), Ok("late".into())], vec![]);
        let token = CancellationToken::new();
        let client = client(transport.clone(), 3).with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            // The first backoff lasts at least 1.5s.
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });
        let err = client.complete("prompt").await.expect_err("cancelled");
        canceller.await.expect("canceller");

        assert!(matches!(err, CompletionError::Cancelled));
        assert_eq!(transport.calls(), vec!["primary".to_string()]);
    }
}
