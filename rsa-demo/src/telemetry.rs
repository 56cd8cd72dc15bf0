//! Interaction logging
//!
//! One event per classification, POSTed as JSON to a remote collector.
//! Delivery is best-effort: the event is sent from a detached task, failures
//! are logged at debug level and dropped. Nothing is retried or queued, and
//! the user-facing workflow never waits on or observes the outcome.

use crate::sentiment::SentimentResult;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Collector returned HTTP {0}")]
    Status(u16),
}

/// Client environment reported alongside each event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientMeta {
    pub url: String,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
    pub language: String,
    pub platform: String,
}

/// Wire format expected by the collector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryEvent {
    pub ts_iso: String,
    pub review: String,
    pub sentiment: String,
    pub meta: ClientMeta,
}

impl TelemetryEvent {
    /// Build an event stamped with the current time
    pub fn new(review: &str, result: &SentimentResult, meta: ClientMeta) -> Self {
        Self {
            ts_iso: rsa_common::time::to_iso_millis(&rsa_common::time::now()),
            review: review.to_string(),
            sentiment: result.summary(),
            meta,
        }
    }
}

/// Destination for telemetry events
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn send(&self, event: &TelemetryEvent) -> Result<(), TelemetryError>;
}

/// POSTs events to a fixed HTTP endpoint, ignoring the response body
pub struct HttpTelemetrySink {
    http_client: Client,
    endpoint: String,
}

impl HttpTelemetrySink {
    pub fn new(http_client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TelemetrySink for HttpTelemetrySink {
    async fn send(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(event)
            .send()
            .await
            .map_err(|e| TelemetryError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TelemetryError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Fire-and-forget front end for a [`TelemetrySink`]
#[derive(Clone, Default)]
pub struct TelemetryEmitter {
    sink: Option<Arc<dyn TelemetrySink>>,
}

impl TelemetryEmitter {
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Emitter that drops every event
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Send `event` in the background
    ///
    /// The returned handle is only useful to tests; callers normally drop it.
    /// The task never panics on delivery failure.
    pub fn emit(&self, event: TelemetryEvent) -> Option<JoinHandle<()>> {
        let sink = self.sink.clone()?;

        Some(tokio::spawn(async move {
            match sink.send(&event).await {
                Ok(()) => debug!("Telemetry event delivered"),
                Err(e) => debug!("Telemetry event dropped: {}", e),
            }
        }))
    }
}
