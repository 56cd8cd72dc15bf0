//! Sentiment result interpretation
//!
//! Turns raw text-classification output into a label, a sentiment category
//! and a confidence score. Anything that does not look like
//! `[[{"label": ..., "score": ...}, ...]]` falls back to a neutral result.

use serde::Serialize;
use serde_json::Value;

/// Label used when the model output cannot be interpreted
pub const NEUTRAL_LABEL: &str = "NEUTRAL";

/// Confidence used when the model output cannot be interpreted
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Sentiment category derived from the classifier label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// "POSITIVE" and "NEGATIVE" map to their categories, anything else is neutral
    pub fn from_label(label: &str) -> Self {
        match label {
            "POSITIVE" => Self::Positive,
            "NEGATIVE" => Self::Negative,
            _ => Self::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }

    /// Font Awesome icon class
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Positive => "fa-thumbs-up",
            Self::Negative => "fa-thumbs-down",
            Self::Neutral => "fa-question-circle",
        }
    }
}

/// Interpreted classification of one review
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentResult {
    pub sentiment: Sentiment,
    pub label: String,
    /// Probability in [0, 1]
    pub score: f64,
}

impl Default for SentimentResult {
    fn default() -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            label: NEUTRAL_LABEL.to_string(),
            score: NEUTRAL_SCORE,
        }
    }
}

impl SentimentResult {
    /// Interpret nested classifier output, using only the top entry
    pub fn from_model_output(output: &Value) -> Self {
        Self::top_prediction(output).unwrap_or_default()
    }

    fn top_prediction(output: &Value) -> Option<Self> {
        let top = output.as_array()?.first()?.as_array()?.first()?;
        let label = top.get("label")?.as_str()?.to_uppercase();
        let score = top.get("score")?.as_f64()?;
        if !score.is_finite() {
            return None;
        }

        Some(Self {
            sentiment: Sentiment::from_label(&label),
            label,
            score: score.clamp(0.0, 1.0),
        })
    }

    /// Confidence as a percentage with one decimal, e.g. "93.0%"
    pub fn confidence_display(&self) -> String {
        format!("{:.1}%", self.score * 100.0)
    }

    /// Short form used in interaction logs, e.g. "POSITIVE (93.0%)"
    pub fn summary(&self) -> String {
        format!("{} ({})", self.label, self.confidence_display())
    }

    /// Text shown next to the icon, e.g. "POSITIVE (93.0% confidence)"
    pub fn display_text(&self) -> String {
        format!("{} ({} confidence)", self.label, self.confidence_display())
    }
}
