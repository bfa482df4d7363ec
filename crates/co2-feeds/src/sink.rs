//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Grid operator data providers and bulletin publishing sinks."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use co2_calc_engine::reports::Report;
use serde_json::json;
use tracing::info;
use url::Url;

use crate::error::FeedError;

/// Destination of a finished bulletin.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn publish(&self, report: &Report) -> Result<(), FeedError>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

/// Writes the bulletin to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

#[async_trait]
impl ReportSink for StdoutSink {
    async fn publish(&self, report: &Report) -> Result<(), FeedError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{report}").map_err(|err| FeedError::PublishFailed {
            status: None,
            reason: err.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// Posts `{"text": <bulletin>}` with a bearer token, as accepted by social feed APIs.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: Url,
    token: String,
}

impl HttpSink {
    pub fn new(
        endpoint: &str,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let endpoint = Url::parse(endpoint).map_err(|err| FeedError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: err.to_string(),
        })?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            token: token.into(),
        })
    }

    /// Build a sink whose token is read from the environment variable `token_env`.
    pub fn from_env(
        endpoint: &str,
        token_env: &str,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let token = std::env::var(token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| FeedError::MissingCredential(token_env.to_owned()))?;
        Self::new(endpoint, token, timeout)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ReportSink for HttpSink {
    async fn publish(&self, report: &Report) -> Result<(), FeedError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&json!({ "text": report.as_str() }))
            .send()
            .await
            .map_err(|err| FeedError::PublishFailed {
                status: None,
                reason: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::PublishFailed {
                status: Some(status.as_u16()),
                reason: format!("HTTP {status}: {body}"),
            });
        }

        info!(endpoint = %self.endpoint, status = status.as_u16(), "bulletin published");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
