//! Error alerts pushed to a Telegram chat.
//!
//! Alerts are fire-and-forget from the caller's point of view: delivery
//! failures are logged by [`notify`] and never change a response.

use crate::config::AlertConfig;
use crate::error::AlertError;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on one Bot API call. Error responses wait on delivery.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// A request failure worth telling someone about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Short description shown to the client.
    pub message: String,
    /// URL that was being scraped, or `Direct input`.
    pub target: String,
    pub timestamp: DateTime<Utc>,
    /// Error chain for unexpected faults.
    pub details: Option<String>,
}

impl Alert {
    /// Creates an alert stamped with the current time.
    pub fn new(message: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            target: target.into(),
            timestamp: Utc::now(),
            details: None,
        }
    }

    /// Attaches error details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Renders the alert as Telegram HTML.
    pub fn to_html(&self) -> String {
        let mut text = format!(
            "🚨 <b>Error Alert</b>\n\n<b>Error:</b> {}\n<b>Target URL:</b> {}\n",
            escape_html(&self.message),
            escape_html(&self.target)
        );
        if let Some(details) = &self.details {
            text.push_str(&format!("<b>Details:</b> {}\n", escape_html(details)));
        }
        text.push_str(&format!(
            "<b>Timestamp:</b> {}\n<b>User Agent:</b> Server-side request",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
        text
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Destination for alerts and plain notifications.
#[async_trait]
pub trait Alerter: Send + Sync {
    /// Sends an HTML-formatted message.
    async fn send_message(&self, html: &str) -> Result<(), AlertError>;

    /// Sends a formatted alert.
    async fn send_alert(&self, alert: &Alert) -> Result<(), AlertError> {
        self.send_message(&alert.to_html()).await
    }
}

/// Sends an alert and logs delivery failures instead of returning them.
pub async fn notify(alerter: &dyn Alerter, alert: &Alert) {
    if let Err(err) = alerter.send_alert(alert).await {
        tracing::warn!(%err, message = %alert.message, "failed to deliver alert");
    }
}

/// Request body for the Bot API `sendMessage` method.
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Delivers alerts through the Telegram Bot API.
pub struct TelegramAlerter {
    client: reqwest::Client,
    config: AlertConfig,
    timeout: Duration,
}

impl TelegramAlerter {
    /// Creates a new alerter with the given configuration.
    pub fn new(config: AlertConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            timeout: SEND_TIMEOUT,
        }
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.telegram_bot_token
        )
    }
}

#[async_trait]
impl Alerter for TelegramAlerter {
    async fn send_message(&self, html: &str) -> Result<(), AlertError> {
        if !self.config.is_configured() {
            return Err(AlertError::NotConfigured);
        }

        let body = SendMessageRequest {
            chat_id: &self.config.telegram_chat_id,
            text: html,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let reply: BotApiResponse = response.json().await?;

        if !status.is_success() || !reply.ok {
            return Err(AlertError::Rejected(
                reply
                    .description
                    .unwrap_or_else(|| format!("HTTP {}", status)),
            ));
        }

        Ok(())
    }
}

/// Alerter used when no Telegram bot is configured; alerts go to the log.
#[derive(Debug, Default)]
pub struct LogAlerter;

#[async_trait]
impl Alerter for LogAlerter {
    async fn send_message(&self, html: &str) -> Result<(), AlertError> {
        tracing::info!(message = html, "alert (telegram not configured)");
        Ok(())
    }
}

/// Picks the Telegram alerter when configured, otherwise the log alerter.
pub fn alerter_from_config(config: &AlertConfig) -> Box<dyn Alerter> {
    if config.is_configured() {
        Box::new(TelegramAlerter::new(config.clone()))
    } else {
        Box::new(LogAlerter)
    }
}
