//! Retrying REST client for the game backend

use super::types::{
    ApiError, FxRatesSnapshot, LeaderboardEntry, LoginRequest, LoginResponse, ScoreRequest,
    ScoreResponse,
};
use crate::config::ApiConfig;
use reqwest::{Client, RequestBuilder, Response};
use std::sync::RwLock;
use std::time::Duration;

/// Retry policy shared by every backend call.
///
/// Only connection-level failures are retried; HTTP status errors are not.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Backoff base; attempt n waits `base * 2^(n-1)`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the given attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// REST client for auth, rates, score persistence, and leaderboards
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Create a client from config with the default retry policy
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        Self::with_retry(config, RetryPolicy::default())
    }

    /// Create a client with a custom retry policy
    pub fn with_retry(config: &ApiConfig, retry: RetryPolicy) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
            retry,
        })
    }

    /// Configured backend base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bearer token held after a successful login
    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    /// Authenticate and store the bearer token for subsequent calls.
    ///
    /// The session awaits this before anything else in live mode.
    pub async fn login(&self, username: &str, password: Option<&str>) -> Result<String, ApiError> {
        let url = format!("{}/auth/login", self.base_url);
        let body = LoginRequest { username, password };

        let response = self
            .send_with_retry(self.http.post(&url).json(&body))
            .await?;
        let login: LoginResponse = parse_json(response).await?;

        if let Ok(mut token) = self.token.write() {
            *token = Some(login.token.clone());
        }
        tracing::info!(username, "logged in to backend");
        Ok(login.token)
    }

    /// Fetch the current FX rate snapshot
    pub async fn fetch_rates(&self) -> Result<FxRatesSnapshot, ApiError> {
        let url = format!("{}/api/fx_rates", self.base_url);
        let response = self.send_with_retry(self.authorized(self.http.get(&url))).await?;
        parse_json(response).await
    }

    /// Post the player's score, best-effort.
    ///
    /// Returns whether the post succeeded; failures are logged and dropped.
    pub async fn post_score(&self, score: &ScoreRequest) -> bool {
        let url = format!("{}/api/game/score", self.base_url);
        let request = self.authorized(self.http.post(&url).json(score));

        match self.send_with_retry(request).await {
            Ok(response) => match parse_json::<ScoreResponse>(response).await {
                Ok(ack) => {
                    tracing::debug!(success = ack.success, message = %ack.message, "score persisted");
                    ack.success
                }
                Err(e) => {
                    tracing::warn!(error = %e, "score post returned malformed response");
                    false
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist score");
                false
            }
        }
    }

    /// Fetch the leaderboard, ordered by rank
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ApiError> {
        let url = format!("{}/api/leaderboard", self.base_url);
        let response = self.send_with_retry(self.authorized(self.http.get(&url))).await?;
        parse_json(response).await
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request, retrying transport failures with exponential backoff.
    ///
    /// HTTP status errors come back as `ApiError::Application` immediately;
    /// after the final attempt a transport failure is returned as-is.
    async fn send_with_retry(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let mut attempt = 1;
        loop {
            let this_try = request
                .try_clone()
                .ok_or_else(|| ApiError::Transport("request body not cloneable".to_string()))?;

            match this_try.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    return Err(ApiError::Application {
                        status: response.status().as_u16(),
                    })
                }
                Err(e) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(ApiError::Transport(e.to_string()));
                    }
                    let delay = self.retry.delay_after(attempt);
                    tracing::warn!(
                        error = %e,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ApiConfig {
        ApiConfig {
            // Port 9 (discard) is unreachable on localhost
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_retry_policy_backoff() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        };
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ApiConfig {
            base_url: "http://localhost:3000/".to_string(),
            timeout_secs: 10,
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_token_starts_absent() {
        let client = ApiClient::new(&test_config()).unwrap();
        assert!(client.token().is_none());
    }

    #[tokio::test]
    async fn test_login_transport_failure_after_retries() {
        let client = ApiClient::with_retry(&test_config(), fast_retry()).unwrap();
        let result = client.login("alice", None).await;
        assert!(matches!(result, Err(ApiError::Transport(_))));
        assert!(client.token().is_none());
    }

    #[tokio::test]
    async fn test_fetch_rates_transport_failure() {
        let client = ApiClient::with_retry(&test_config(), fast_retry()).unwrap();
        let result = client.fetch_rates().await;
        assert!(matches!(result, Err(ApiError::Transport(_))));
    }

    #[tokio::test]
    async fn test_post_score_failure_returns_false() {
        let client = ApiClient::with_retry(&test_config(), fast_retry()).unwrap();
        let request = ScoreRequest {
            username: "alice".to_string(),
            score: 100.0,
            credits: 9900.0,
            stats: crate::api::StatsPayload { wins: 1, losses: 0 },
        };
        // Unreachable backend: logged and dropped, never a panic
        assert!(!client.post_score(&request).await);
    }

    #[tokio::test]
    async fn test_leaderboard_transport_failure() {
        let client = ApiClient::with_retry(&test_config(), fast_retry()).unwrap();
        assert!(client.leaderboard().await.is_err());
    }
}
