//! Presentation state
//!
//! The browser page is a thin renderer: it binds fixed element ids to the
//! fields of [`ViewSnapshot`]. Every mutation bumps the revision and is
//! broadcast to SSE subscribers.
//!
//! The state sits behind a `std::sync::Mutex` so the analysis guard can
//! restore it from `Drop`.

use crate::sentiment::{Sentiment, SentimentResult};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

/// Workflow phase shown to the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    Idle,
    Analyzing,
    Done,
    Error,
}

/// Result block as the page draws it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedResult {
    pub sentiment: Sentiment,
    pub label: String,
    pub score: f64,
    pub confidence: String,
    pub icon: &'static str,
    pub style_class: String,
    pub text: String,
}

impl From<&SentimentResult> for RenderedResult {
    fn from(result: &SentimentResult) -> Self {
        Self {
            sentiment: result.sentiment,
            label: result.label.clone(),
            score: result.score,
            confidence: result.confidence_display(),
            icon: result.sentiment.icon(),
            style_class: format!("sentiment-result {}", result.sentiment.as_str()),
            text: result.display_text(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSnapshot {
    pub revision: u64,
    pub phase: WorkflowPhase,
    pub review_text: Option<String>,
    pub loading: bool,
    pub trigger_enabled: bool,
    pub result: Option<RenderedResult>,
    pub error: Option<String>,
    pub status: String,
    pub token_input: String,
}

impl Default for ViewSnapshot {
    fn default() -> Self {
        Self {
            revision: 0,
            phase: WorkflowPhase::Idle,
            review_text: None,
            loading: false,
            trigger_enabled: true,
            result: None,
            error: None,
            status: String::new(),
            token_input: String::new(),
        }
    }
}

/// Returned by [`ViewModel::begin_analysis`] when the trigger is disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerDisabled;

#[derive(Clone)]
pub struct ViewModel {
    state: Arc<Mutex<ViewSnapshot>>,
    tx: broadcast::Sender<ViewSnapshot>,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self::new(64)
    }
}

impl ViewModel {
    /// `capacity`: snapshots buffered per slow subscriber before it lags
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            state: Arc::new(Mutex::new(ViewSnapshot::default())),
            tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewSnapshot> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update(&self, apply: impl FnOnce(&mut ViewSnapshot)) {
        let snapshot = {
            let mut state = self.lock();
            apply(&mut state);
            state.revision += 1;
            state.clone()
        };
        // No subscribers is fine
        let _ = self.tx.send(snapshot);
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.lock().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewSnapshot> {
        self.tx.subscribe()
    }

    pub fn trigger_enabled(&self) -> bool {
        self.lock().trigger_enabled
    }

    pub fn show_review(&self, text: &str) {
        let text = text.to_string();
        self.update(|s| s.review_text = Some(text));
    }

    pub fn set_loading(&self, loading: bool) {
        self.update(|s| s.loading = loading);
    }

    pub fn set_trigger_enabled(&self, enabled: bool) {
        self.update(|s| s.trigger_enabled = enabled);
    }

    pub fn clear_result(&self) {
        self.update(|s| s.result = None);
    }

    pub fn render_result(&self, result: &SentimentResult) {
        let rendered = RenderedResult::from(result);
        self.update(|s| s.result = Some(rendered));
    }

    /// Show the error banner, replacing any previous message
    pub fn show_error(&self, message: &str) {
        let message = message.to_string();
        self.update(|s| s.error = Some(message));
    }

    pub fn hide_error(&self) {
        self.update(|s| s.error = None);
    }

    pub fn set_phase(&self, phase: WorkflowPhase) {
        self.update(|s| s.phase = phase);
    }

    pub fn set_status(&self, status: &str) {
        let status = status.to_string();
        self.update(|s| s.status = status);
    }

    pub fn set_token_input(&self, value: &str) {
        let value = value.to_string();
        self.update(|s| s.token_input = value);
    }

    /// Start of a user action: clear the banner and return to idle
    ///
    /// Leaves the view untouched when the trigger is disabled. Check and
    /// reset happen under one lock.
    pub fn begin_action(&self) -> Result<(), TriggerDisabled> {
        let snapshot = {
            let mut state = self.lock();
            if !state.trigger_enabled {
                return Err(TriggerDisabled);
            }
            state.error = None;
            state.phase = WorkflowPhase::Idle;
            state.revision += 1;
            state.clone()
        };
        let _ = self.tx.send(snapshot);
        Ok(())
    }

    /// Enter the analyzing phase for `review`, unless one is already running
    ///
    /// The trigger check and all changes happen under one lock.
    pub fn begin_analysis(&self, review: &str) -> Result<(), TriggerDisabled> {
        let snapshot = {
            let mut state = self.lock();
            if !state.trigger_enabled {
                return Err(TriggerDisabled);
            }
            state.review_text = Some(review.to_string());
            state.loading = true;
            state.trigger_enabled = false;
            state.result = None;
            state.phase = WorkflowPhase::Analyzing;
            state.revision += 1;
            state.clone()
        };
        let _ = self.tx.send(snapshot);
        Ok(())
    }

    /// Hide the loading indicator and re-enable the trigger
    pub fn end_analysis(&self) {
        self.update(|s| {
            s.loading = false;
            s.trigger_enabled = true;
        });
    }
}
