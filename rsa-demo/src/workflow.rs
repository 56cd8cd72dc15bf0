//! Analysis workflow
//!
//! One user action: pick a random review, classify it, render the result and
//! log the interaction.
//!
//! Phases: Idle → Analyzing → Done | Error. While a classification is in
//! flight the trigger is disabled, and that flag is the only mutual
//! exclusion between actions. [`AnalysisGuard`] re-enables the trigger and
//! hides the loading indicator on every exit path, including when the
//! request future is dropped mid-flight.

use crate::classifier::{ClassifierError, ClassifierHandle};
use crate::reviews::ReviewStore;
use crate::sentiment::SentimentResult;
use crate::telemetry::{ClientMeta, TelemetryEmitter, TelemetryEvent};
use crate::view::{ViewModel, WorkflowPhase};
use crate::AppState;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Banner shown when analysis is triggered before startup finished
pub const NOT_READY_MESSAGE: &str = "Model or reviews not ready";

/// Banner shown when the classifier rejects a request
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze sentiment";

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Trigger is disabled: an analysis is already running
    #[error("An analysis is already in progress")]
    Busy,

    #[error("{}", NOT_READY_MESSAGE)]
    NotReady,

    #[error("Classification failed: {0}")]
    Classification(#[from] ClassifierError),
}

/// Successful analysis, as returned to the API caller
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub review: String,
    #[serde(flatten)]
    pub result: SentimentResult,
    pub confidence_display: String,
}

/// Restores the trigger and loading indicator when dropped
pub struct AnalysisGuard<'a> {
    view: &'a ViewModel,
}

impl<'a> AnalysisGuard<'a> {
    /// Enter the analyzing phase for `review`
    pub fn begin(view: &'a ViewModel, review: &str) -> Result<Self, WorkflowError> {
        view.begin_analysis(review)
            .map_err(|_| WorkflowError::Busy)?;
        Ok(Self { view })
    }
}

impl Drop for AnalysisGuard<'_> {
    fn drop(&mut self) {
        self.view.end_analysis();
    }
}

/// Runs the analysis workflow against borrowed application state
pub struct AnalysisController<'a> {
    reviews: &'a ReviewStore,
    classifier: &'a ClassifierHandle,
    telemetry: &'a TelemetryEmitter,
    view: &'a ViewModel,
}

impl<'a> AnalysisController<'a> {
    pub fn new(
        reviews: &'a ReviewStore,
        classifier: &'a ClassifierHandle,
        telemetry: &'a TelemetryEmitter,
        view: &'a ViewModel,
    ) -> Self {
        Self {
            reviews,
            classifier,
            telemetry,
            view,
        }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(&state.reviews, &state.classifier, &state.telemetry, &state.view)
    }

    /// Analyze one randomly chosen review
    pub async fn analyze_random_review(
        &self,
        meta: ClientMeta,
    ) -> Result<AnalysisOutcome, WorkflowError> {
        // A disabled trigger cannot be pressed: no view changes at all
        if self.view.begin_action().is_err() {
            debug!("Analyze requested while trigger disabled");
            return Err(WorkflowError::Busy);
        }

        let classifier = self.classifier.ready().await;
        let review = self.reviews.pick_random().await;
        let (Some(classifier), Some(review)) = (classifier, review) else {
            self.view.show_error(NOT_READY_MESSAGE);
            self.view.set_phase(WorkflowPhase::Error);
            return Err(WorkflowError::NotReady);
        };

        let _guard = AnalysisGuard::begin(self.view, review.text())?;
        debug!(review_length = review.text().len(), "Analyzing review");

        match classifier.classify(review.text()).await {
            Ok(output) => {
                let result = SentimentResult::from_model_output(&output);
                self.view.render_result(&result);

                self.telemetry
                    .emit(TelemetryEvent::new(review.text(), &result, meta));

                self.view.set_phase(WorkflowPhase::Done);
                info!(
                    label = %result.label,
                    confidence = %result.confidence_display(),
                    "Review analyzed"
                );

                Ok(AnalysisOutcome {
                    review: review.text().to_string(),
                    confidence_display: result.confidence_display(),
                    result,
                })
            }
            Err(e) => {
                warn!("Classification failed: {}", e);
                self.view.show_error(ANALYSIS_FAILED_MESSAGE);
                self.view.set_phase(WorkflowPhase::Error);
                Err(WorkflowError::Classification(e))
            }
        }
    }
}
