//! Sentiment classifier adapter
//!
//! The model itself is an external collaborator. This module defines the
//! seam ([`SentimentClassifier`]) and the readiness-gated handle the workflow
//! uses. A classifier only becomes usable after `initialize` succeeds.

pub mod huggingface;

pub use huggingface::HuggingFaceClassifier;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Classifier errors
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Network-level failure reaching the model
    #[error("Network error: {0}")]
    Network(String),

    /// Model is missing or could not be loaded
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Inference endpoint returned an error status
    #[error("Inference API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body was not JSON
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A pretrained text-classification model
///
/// `classify` returns the raw model output, normalized to the nested shape
/// `[[{"label": ..., "score": ...}, ...]]`. Interpretation happens in
/// [`crate::sentiment::SentimentResult::from_model_output`].
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Model identifier, for logs and status
    fn model_id(&self) -> &str;

    /// Load or verify the model. Called once at startup.
    async fn initialize(&self) -> Result<(), ClassifierError>;

    /// Classify one text. No timeout, no retry.
    async fn classify(&self, text: &str) -> Result<Value, ClassifierError>;
}

/// Initialization progress of the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Loading,
    Ready,
    Failed,
}

struct Slot {
    classifier: Option<Arc<dyn SentimentClassifier>>,
    state: ModelState,
}

/// Shared handle to the classifier, empty until initialization succeeds
#[derive(Clone)]
pub struct ClassifierHandle {
    slot: Arc<RwLock<Slot>>,
}

impl Default for ClassifierHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierHandle {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(RwLock::new(Slot {
                classifier: None,
                state: ModelState::Loading,
            })),
        }
    }

    /// Initialize `classifier` and, on success, make it available
    pub async fn initialize(
        &self,
        classifier: Arc<dyn SentimentClassifier>,
    ) -> Result<(), ClassifierError> {
        let outcome = classifier.initialize().await;

        let mut slot = self.slot.write().await;
        match outcome {
            Ok(()) => {
                slot.classifier = Some(classifier);
                slot.state = ModelState::Ready;
                Ok(())
            }
            Err(e) => {
                slot.classifier = None;
                slot.state = ModelState::Failed;
                Err(e)
            }
        }
    }

    /// The classifier, if ready
    pub async fn ready(&self) -> Option<Arc<dyn SentimentClassifier>> {
        self.slot.read().await.classifier.clone()
    }

    pub async fn is_ready(&self) -> bool {
        self.slot.read().await.classifier.is_some()
    }

    pub async fn state(&self) -> ModelState {
        self.slot.read().await.state
    }
}
