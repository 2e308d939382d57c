use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::NotifierConfig;
use crate::report::MatchReport;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Other(String),
}

/// One delivery attempt to the ledger. Returns the HTTP status so the
/// retry loop can decide; transport-level failures map to errors.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    async fn send(&self, report: &MatchReport) -> Result<u16, TransportError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(config: &NotifierConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl LedgerTransport for HttpTransport {
    async fn send(&self, report: &MatchReport) -> Result<u16, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Service-Key", &self.api_key)
            .json(report)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else if e.is_connect() {
                    TransportError::Connect(e.to_string())
                } else {
                    TransportError::Other(e.to_string())
                }
            })?;

        Ok(response.status().as_u16())
    }
}

/// Consumed by the match engine when a match reaches its terminal
/// state. Implementations must never affect the match itself: the
/// return value only says whether the ledger acknowledged.
#[async_trait]
pub trait ResultNotifier: Send + Sync {
    async fn finalize_match(&self, report: &MatchReport) -> bool;
}

/// Retrying ledger client. Any non-success status, timeout, connect
/// failure or other transport error triggers another attempt after an
/// exponential backoff of `min(base^attempt, max_wait)` seconds.
pub struct LedgerClient<T> {
    transport: T,
    max_attempts: u32,
    backoff_base: u64,
    max_wait: Duration,
}

impl LedgerClient<HttpTransport> {
    pub fn from_config(config: &NotifierConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(HttpTransport::new(config)?, config))
    }
}

impl<T: LedgerTransport> LedgerClient<T> {
    pub fn new(transport: T, config: &NotifierConfig) -> Self {
        Self {
            transport,
            max_attempts: config.max_retry_attempts,
            backoff_base: config.backoff_base,
            max_wait: config.max_retry_wait,
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.backoff_base.saturating_pow(attempt)).min(self.max_wait)
    }
}

#[async_trait]
impl<T: LedgerTransport> ResultNotifier for LedgerClient<T> {
    async fn finalize_match(&self, report: &MatchReport) -> bool {
        let match_id = report.external_match_id.as_str();

        for attempt in 1..=self.max_attempts {
            match self.transport.send(report).await {
                Ok(status) if (200..300).contains(&status) => {
                    tracing::info!(match_id, "match finalized at ledger");
                    return true;
                }
                Ok(status) => {
                    tracing::warn!(
                        match_id,
                        status,
                        attempt,
                        max_attempts = self.max_attempts,
                        "ledger rejected finalize"
                    );
                }
                Err(TransportError::Timeout) => {
                    tracing::warn!(
                        match_id,
                        attempt,
                        max_attempts = self.max_attempts,
                        "finalize timed out"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        match_id,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "finalize attempt failed"
                    );
                }
            }

            if attempt < self.max_attempts {
                let wait = self.backoff_delay(attempt);
                tracing::info!(match_id, wait_secs = wait.as_secs(), "waiting before retry");
                tokio::time::sleep(wait).await;
            }
        }

        tracing::error!(
            match_id,
            attempts = self.max_attempts,
            "failed to finalize match; result may not be reflected in player stats"
        );
        false
    }
}

/// No-op notifier for tests and offline runs.
pub struct NoopNotifier;

#[async_trait]
impl ResultNotifier for NoopNotifier {
    async fn finalize_match(&self, _report: &MatchReport) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::report::TurnReport;

    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<u16, TransportError>>>,
        calls: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<u16, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LedgerTransport for &ScriptedTransport {
        async fn send(&self, _report: &MatchReport) -> Result<u16, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(TransportError::Connect("script exhausted".to_string())))
        }
    }

    fn test_config() -> NotifierConfig {
        NotifierConfig {
            base_url: "http://ledger".to_string(),
            finalize_path: "/matches".to_string(),
            api_key: "test_key".to_string(),
            timeout: Duration::from_secs(5),
            max_retry_attempts: 3,
            backoff_base: 2,
            max_retry_wait: Duration::from_secs(10),
        }
    }

    fn sample_report() -> MatchReport {
        MatchReport {
            external_match_id: "match-1".to_string(),
            player1_external_id: "alice".to_string(),
            player2_external_id: "bob".to_string(),
            winner_external_id: Some("alice".to_string()),
            player1_score: 3,
            player2_score: 1,
            status: "finished".to_string(),
            turns: vec![TurnReport {
                turn_number: 1,
                player1_card_name: "rock 3".to_string(),
                player2_card_name: "scissors 6".to_string(),
                winner_external_id: Some("alice".to_string()),
            }],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_first_attempt_without_sleeping() {
        let transport = ScriptedTransport::new(vec![Ok(201)]);
        let client = LedgerClient::new(&transport, &test_config());

        let started = tokio::time::Instant::now();
        assert!(client.finalize_match(&sample_report()).await);

        assert_eq!(transport.calls(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_through_two_failures_with_exponential_backoff() {
        let transport = ScriptedTransport::new(vec![
            Ok(503),
            Err(TransportError::Timeout),
            Ok(200),
        ]);
        let client = LedgerClient::new(&transport, &test_config());

        let started = tokio::time::Instant::now();
        assert!(client.finalize_match(&sample_report()).await);

        // 2s after attempt 1, 4s after attempt 2
        assert_eq!(transport.calls(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Connect("refused".to_string())),
            Err(TransportError::Connect("refused".to_string())),
            Err(TransportError::Connect("refused".to_string())),
            Ok(200),
        ]);
        let client = LedgerClient::new(&transport, &test_config());

        let started = tokio::time::Instant::now();
        assert!(!client.finalize_match(&sample_report()).await);

        // exactly max_retry_attempts calls, no sleep after the last
        assert_eq!(transport.calls(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[test]
    fn backoff_is_capped_at_max_wait() {
        let mut config = test_config();
        config.max_retry_attempts = 6;
        let transport = ScriptedTransport::new(vec![]);
        let client = LedgerClient::new(&transport, &config);

        assert_eq!(client.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(client.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(client.backoff_delay(3), Duration::from_secs(8));
        assert_eq!(client.backoff_delay(4), Duration::from_secs(10));
        assert_eq!(client.backoff_delay(5), Duration::from_secs(10));
    }
}
