// src/ingest/fetch.rs
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ingest::orchestrator::SourceState;
use crate::ingest::types::RetrievalError;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; draw-ranker/0.1; +https://github.com/draw-ranker)";

/// Network retrieval seam. Implementations must be side-effect free per call.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, RetrievalError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: u32,
    /// Fixed pause between attempts.
    pub backoff_ms: u64,
    /// Timeout of a single HTTP request.
    pub request_timeout_secs: u64,
    /// Budget for one source including all retries and backoff.
    pub per_source_timeout_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            backoff_ms: 1_500,
            request_timeout_secs: 20,
            per_source_timeout_secs: 90,
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn per_source_timeout(&self) -> Duration {
        Duration::from_secs(self.per_source_timeout_secs)
    }
}

/// reqwest-backed fetcher with a descriptive User-Agent (several sources block bare clients).
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, request_timeout: Duration) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(request_timeout)
            .build()
            .map_err(|e| RetrievalError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            timeout: request_timeout,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, RetrievalError> {
        let rsp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                RetrievalError::Timeout(self.timeout)
            } else {
                RetrievalError::Transport(e.to_string())
            }
        })?;

        let status = rsp.status();
        if !status.is_success() {
            return Err(RetrievalError::Status(status.as_u16()));
        }

        // reqwest decodes using the charset from Content-Type, falling back to UTF-8.
        rsp.text()
            .await
            .map_err(|e| RetrievalError::Transport(e.to_string()))
    }
}

/// Fetch `url` with `policy.retries` extra attempts and a fixed backoff.
/// `attempts` is updated as the loop runs, so it stays meaningful when the caller
/// abandons the future on a timeout.
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    source: &str,
    url: &str,
    policy: &RetryPolicy,
    attempts: &mut u32,
) -> Result<String, RetrievalError> {
    loop {
        *attempts += 1;
        counter!("ingest_fetch_attempts_total").increment(1);

        match fetcher.fetch(url).await {
            Ok(body) => return Ok(body),
            Err(e) if *attempts <= policy.retries => {
                tracing::warn!(
                    source,
                    attempt = *attempts,
                    state = ?SourceState::Retrying,
                    error = %e,
                    "fetch failed, retrying"
                );
                tokio::time::sleep(policy.backoff()).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        fail_first: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Fetcher for Flaky {
        async fn fetch(&self, _url: &str) -> Result<String, RetrievalError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_first {
                Err(RetrievalError::Status(503))
            } else {
                Ok("ok".into())
            }
        }
    }

    fn quick(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            backoff_ms: 0,
            ..RetryPolicy::default()
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let f = Flaky {
            fail_first: 2,
            calls: AtomicU32::new(0),
        };
        let mut attempts = 0;
        let body = fetch_with_retry(&f, "s", "u", &quick(2), &mut attempts)
            .await
            .unwrap();
        assert_eq!(body, "ok");
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn gives_up_after_retries() {
        let f = Flaky {
            fail_first: 10,
            calls: AtomicU32::new(0),
        };
        let mut attempts = 0;
        let err = fetch_with_retry(&f, "s", "u", &quick(1), &mut attempts)
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Status(503)));
        assert_eq!(attempts, 2);
    }
}
