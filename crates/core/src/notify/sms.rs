use crate::config::Settings;
use anyhow::{Context, Result};
use serde_json::json;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[async_trait::async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, message: &str) -> Result<()>;
}

/// Thin SMS gateway client: one JSON POST per message, no retry. Provider
/// specifics (Twilio or otherwise) live behind the gateway URL.
#[derive(Debug, Clone)]
pub struct HttpSmsGateway {
    http: reqwest::Client,
    url: String,
    token: Option<String>,
    to: String,
    from: Option<String>,
}

impl HttpSmsGateway {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let url = settings.require_sms_gateway_url()?.to_string();
        let to = settings.require_sms_to_number()?.to_string();

        let timeout_secs = std::env::var("SMS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build sms http client")?;

        Ok(Self {
            http,
            url,
            token: settings.sms_gateway_token.clone(),
            to,
            from: settings.sms_from_number.clone(),
        })
    }
}

#[async_trait::async_trait]
impl Messenger for HttpSmsGateway {
    async fn send(&self, message: &str) -> Result<()> {
        let body = json!({
            "to": self.to,
            "from": self.from,
            "body": message,
        });

        let mut req = self.http.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let res = req.send().await.context("sms gateway request failed")?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            anyhow::bail!("sms gateway HTTP {status}: {text}");
        }

        tracing::info!(chars = message.chars().count(), "sms accepted by gateway");
        Ok(())
    }
}

/// Stand-in messenger for dry runs; logs the message instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct NoopMessenger;

#[async_trait::async_trait]
impl Messenger for NoopMessenger {
    async fn send(&self, message: &str) -> Result<()> {
        tracing::info!(chars = message.chars().count(), "sms suppressed (noop messenger)");
        Ok(())
    }
}
