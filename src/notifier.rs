use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

const MAX_NOTICES: usize = 32;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

/// Transient user-facing notices, plus an optional webhook mirror.
///
/// Recording a notice never waits on the network: the webhook POST runs on its
/// own task under the client timeout.
#[derive(Clone)]
pub struct Notifier {
    webhook_url: Option<String>,
    http: Client,
    recent: Arc<Mutex<VecDeque<Notice>>>,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

impl Notifier {
    pub fn new(webhook_url: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            webhook_url,
            http,
            recent: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_NOTICES))),
        })
    }

    pub fn info(&self, title: &str, body: impl Into<String>) {
        self.push(Notice { level: NoticeLevel::Info, title: title.to_string(), body: body.into() });
    }

    pub fn error(&self, title: &str, body: impl Into<String>) {
        self.push(Notice { level: NoticeLevel::Error, title: title.to_string(), body: body.into() });
    }

    fn push(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(title = %notice.title, body = %notice.body, "notice"),
            NoticeLevel::Error => warn!(title = %notice.title, body = %notice.body, "notice"),
        }
        let text = format!("{}: {}", notice.title, notice.body);
        {
            let mut recent = self.recent.lock().unwrap_or_else(|p| p.into_inner());
            if recent.len() == MAX_NOTICES {
                recent.pop_front();
            }
            recent.push_back(notice);
        }
        let Some(url) = self.webhook_url.clone() else {
            return;
        };
        let http = self.http.clone();
        tokio::spawn(async move {
            if let Err(e) = post_webhook(&http, &url, &text).await {
                warn!(error = %e, "notifier.webhook_failed");
            }
        });
    }

    /// Oldest first.
    pub fn recent(&self) -> Vec<Notice> {
        self.recent.lock().unwrap_or_else(|p| p.into_inner()).iter().cloned().collect()
    }
}

async fn post_webhook(http: &Client, url: &str, text: &str) -> Result<()> {
    let resp = http.post(url).json(&WebhookPayload { text }).send().await?;

    if !resp.status().is_success() {
        return Err(anyhow!("webhook failed: {}", resp.status()));
    }

    Ok(())
}
