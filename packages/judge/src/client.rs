use std::collections::HashMap;

use async_trait::async_trait;
use common::JudgeConfig;
use reqwest::{Client, RequestBuilder};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::error::JudgeError;
use crate::types::{BatchRequest, BatchResults, BatchSubmission, JudgeResult, JudgeToken, TokenEntry};

/// Something that can run batches of submissions to completion.
///
/// `Judge0Client` is the production implementation; the evaluator only
/// depends on this trait.
#[async_trait]
pub trait JudgeBackend: Send + Sync {
    /// Submit all cases in one request. Tokens come back in submission order.
    async fn submit_batch(
        &self,
        submissions: &[BatchSubmission],
    ) -> Result<Vec<JudgeToken>, JudgeError>;

    /// Poll until every token has a terminal result. Results are ordered to
    /// match `tokens`.
    async fn poll_until_complete(
        &self,
        tokens: &[JudgeToken],
        cancel: &CancellationToken,
    ) -> Result<Vec<JudgeResult>, JudgeError>;
}

/// HTTP client for the Judge0 batch API.
#[derive(Clone)]
pub struct Judge0Client {
    http: Client,
    base_url: String,
    config: JudgeConfig,
}

impl Judge0Client {
    pub fn new(config: JudgeConfig) -> Result<Self, JudgeError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    fn batch_url(&self) -> String {
        format!("{}/submissions/batch", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.auth_token {
            Some(ref token) => request.header("X-Auth-Token", token),
            None => request,
        }
    }

    /// One `GET /submissions/batch` round, reordered to match `tokens`.
    async fn fetch_batch(&self, tokens: &[JudgeToken]) -> Result<Vec<JudgeResult>, JudgeError> {
        let joined = tokens
            .iter()
            .map(JudgeToken::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let response = self
            .authorize(self.http.get(self.batch_url()))
            .query(&[("tokens", joined.as_str()), ("base64_encoded", "false")])
            .send()
            .await?
            .error_for_status()?;

        let body: BatchResults = response.json().await?;
        correlate(tokens, body.submissions)
    }

    async fn poll_rounds(
        &self,
        tokens: &[JudgeToken],
        cancel: &CancellationToken,
    ) -> Result<Vec<JudgeResult>, JudgeError> {
        let interval = self.config.poll_interval();

        for attempt in 1..=self.config.max_poll_attempts {
            let results = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(JudgeError::Cancelled),
                results = self.fetch_batch(tokens) => results?,
            };

            let pending = results.iter().filter(|r| !r.status.is_terminal()).count();
            if pending == 0 {
                debug!(attempt, "All judge results terminal");
                return Ok(results);
            }
            debug!(attempt, pending, "Judge results still pending");
            if attempt == self.config.max_poll_attempts {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(JudgeError::Cancelled),
                _ = tokio::time::sleep(interval) => {}
            }
        }

        Err(JudgeError::Timeout(format!(
            "results still pending after {} poll attempts",
            self.config.max_poll_attempts
        )))
    }
}

#[async_trait]
impl JudgeBackend for Judge0Client {
    #[instrument(skip(self, submissions), fields(count = submissions.len()))]
    async fn submit_batch(
        &self,
        submissions: &[BatchSubmission],
    ) -> Result<Vec<JudgeToken>, JudgeError> {
        let response = self
            .authorize(self.http.post(self.batch_url()))
            .query(&[("base64_encoded", "false")])
            .json(&BatchRequest { submissions })
            .send()
            .await?
            .error_for_status()?;

        let entries: Vec<TokenEntry> = response.json().await?;
        if entries.len() != submissions.len() {
            return Err(JudgeError::Upstream(format!(
                "expected {} tokens, judge returned {}",
                submissions.len(),
                entries.len()
            )));
        }

        entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                entry.token.ok_or_else(|| {
                    JudgeError::Upstream(format!("judge rejected submission {}", i + 1))
                })
            })
            .collect()
    }

    #[instrument(skip(self, tokens, cancel), fields(count = tokens.len()))]
    async fn poll_until_complete(
        &self,
        tokens: &[JudgeToken],
        cancel: &CancellationToken,
    ) -> Result<Vec<JudgeResult>, JudgeError> {
        if tokens.is_empty() {
            return Ok(vec![]);
        }

        let deadline = self.config.poll_timeout();
        match tokio::time::timeout(deadline, self.poll_rounds(tokens, cancel)).await {
            Ok(results) => results,
            Err(_) => {
                warn!(deadline_secs = deadline.as_secs(), "Judge polling deadline exceeded");
                Err(JudgeError::Timeout(format!(
                    "results still pending after {}s",
                    deadline.as_secs()
                )))
            }
        }
    }
}

/// Put batch results into token order. Judge0 echoes tokens back when asked
/// for them; without them the response order is trusted.
fn correlate(
    tokens: &[JudgeToken],
    results: Vec<Option<JudgeResult>>,
) -> Result<Vec<JudgeResult>, JudgeError> {
    if results.len() != tokens.len() {
        return Err(JudgeError::Upstream(format!(
            "expected {} results, judge returned {}",
            tokens.len(),
            results.len()
        )));
    }

    let results = results
        .into_iter()
        .map(|r| r.ok_or_else(|| JudgeError::Upstream("judge returned an unknown token".into())))
        .collect::<Result<Vec<_>, _>>()?;

    if results.iter().any(|r| r.token.is_none()) {
        return Ok(results);
    }

    let mut by_token: HashMap<JudgeToken, JudgeResult> = results
        .into_iter()
        .filter_map(|r| r.token.clone().map(|t| (t, r)))
        .collect();

    tokens
        .iter()
        .map(|token| {
            by_token.remove(token).ok_or_else(|| {
                JudgeError::Upstream(format!("no result for token {}", token.as_str()))
            })
        })
        .collect()
}
