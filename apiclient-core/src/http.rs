use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{error::AttemptError, stats::Stats};

const USER_AGENT: &str = "APIClient/1.0";

/// Outcome of one GET attempt. Failures are data, never errors.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: Result<(), AttemptError>,
    /// Decoded body when it is a JSON object; anything else is `None`.
    pub body: Option<Map<String, Value>>,
    pub elapsed: Duration,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_ok()
    }

    /// The body, if the attempt succeeded and the body holds at least one field.
    pub fn usable_body(&self) -> Option<&Map<String, Value>> {
        if !self.is_success() {
            return None;
        }
        self.body.as_ref().filter(|body| !body.is_empty())
    }
}

/// GET wrapper over a pooled `reqwest::Client` with a fixed timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    stats: Arc<Stats>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, stats: Arc<Stats>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "failed to build HTTP client, using defaults");
                Client::new()
            });

        Self { http, stats }
    }

    /// Performs one GET and records it in the attempt counter.
    pub async fn get(&self, url: &str, params: &[(String, String)]) -> RawResponse {
        let started = Instant::now();
        let result = self.fetch(url, params).await;
        self.stats.record_attempt();
        let elapsed = started.elapsed();

        match result {
            Ok((status, body)) if status == StatusCode::OK => {
                debug!(url, elapsed_ms = elapsed.as_millis() as u64, "request succeeded");
                RawResponse {
                    status: Ok(()),
                    body,
                    elapsed,
                }
            }
            Ok((status, body)) => {
                warn!(url, status = status.as_u16(), "request returned non-200 status");
                RawResponse {
                    status: Err(AttemptError::Status(status.as_u16())),
                    body,
                    elapsed,
                }
            }
            Err(err) => {
                let error = classify(&err);
                warn!(url, error = %error, "request failed");
                RawResponse {
                    status: Err(error),
                    body: None,
                    elapsed,
                }
            }
        }
    }

    /// Returns `true` only when `url` answers 200 within `timeout`.
    /// Not counted as an attempt.
    pub async fn is_reachable(&self, url: &str, timeout: Duration) -> bool {
        match self.http.get(url).timeout(timeout).send().await {
            Ok(res) => res.status() == StatusCode::OK,
            Err(err) => {
                debug!(url, error = %err, "connectivity check failed");
                false
            }
        }
    }

    async fn fetch(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> reqwest::Result<(StatusCode, Option<Map<String, Value>>)> {
        let res = self.http.get(url).query(params).send().await?;
        let status = res.status();
        let text = res.text().await?;

        Ok((status, decode_object(&text)))
    }
}

fn classify(err: &reqwest::Error) -> AttemptError {
    if err.is_timeout() {
        AttemptError::Timeout
    } else {
        AttemptError::Transport(err.to_string())
    }
}

fn decode_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
