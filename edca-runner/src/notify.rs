//! Notification gateways.
//!
//! `LineGateway` pushes the report to one LINE user through the Messaging
//! API. `StdoutGateway` prints it instead (dry runs). Sends are not retried.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, LineCredentials, NotifyConfig, NotifyKind};

/// LINE Messaging API push endpoint.
pub const LINE_PUSH_URL: &str = "https://api.line.me/v2/bot/message/push";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error("notification rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Acknowledgement of a delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub gateway: String,
    /// HTTP status for network gateways.
    pub status: Option<u16>,
}

/// Sink for the rendered report.
pub trait NotificationGateway: Send + Sync {
    fn name(&self) -> &str;

    fn send(&self, text: &str) -> Result<Delivery, NotifyError>;
}

// ─── LINE ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PushMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct PushPayload<'a> {
    to: &'a str,
    messages: [PushMessage<'a>; 1],
}

fn push_payload<'a>(user_id: &'a str, text: &'a str) -> PushPayload<'a> {
    PushPayload {
        to: user_id,
        messages: [PushMessage { kind: "text", text }],
    }
}

pub struct LineGateway {
    client: reqwest::blocking::Client,
    credentials: LineCredentials,
    endpoint: String,
}

impl LineGateway {
    pub fn new(credentials: LineCredentials, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;
        Ok(Self {
            client,
            credentials,
            endpoint: LINE_PUSH_URL.to_string(),
        })
    }

    /// Point the gateway at another endpoint (a local stub server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl NotificationGateway for LineGateway {
    fn name(&self) -> &str {
        "line"
    }

    fn send(&self, text: &str) -> Result<Delivery, NotifyError> {
        debug!(endpoint = %self.endpoint, chars = text.chars().count(), "pushing LINE message");
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.credentials.access_token)
            .json(&push_payload(&self.credentials.user_id, text))
            .send()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(status = status.as_u16(), "LINE message delivered");
        Ok(Delivery {
            gateway: self.name().to_string(),
            status: Some(status.as_u16()),
        })
    }
}

// ─── Stdout ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutGateway;

impl NotificationGateway for StdoutGateway {
    fn name(&self) -> &str {
        "stdout"
    }

    fn send(&self, text: &str) -> Result<Delivery, NotifyError> {
        println!("{text}");
        Ok(Delivery {
            gateway: self.name().to_string(),
            status: None,
        })
    }
}

// ─── Selection ──────────────────────────────────────────────────────

/// Gateway for `config`. `dry_run` forces stdout. Reading LINE credentials
/// happens here, so a missing token fails before any data is fetched.
pub fn gateway_for(config: &NotifyConfig, dry_run: bool) -> Result<Box<dyn NotificationGateway>, ConfigError> {
    if dry_run {
        return Ok(Box::new(StdoutGateway));
    }
    match config.kind {
        NotifyKind::Stdout => Ok(Box::new(StdoutGateway)),
        NotifyKind::Line => {
            let credentials = LineCredentials::from_env()?;
            let gateway = LineGateway::new(credentials, Duration::from_secs(config.timeout_secs))
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            Ok(Box::new(gateway))
        }
    }
}
