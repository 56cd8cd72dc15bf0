//! Hugging Face inference API client
//!
//! Classifies text with a hosted text-classification model.
//!
//! # API Reference
//! - Model metadata: `GET {hub_url}/api/models/{model}`
//! - Inference: `POST {inference_url}/models/{model}` with `{"inputs": text}`
//!
//! The saved access token, when present, is sent as a bearer credential on
//! every request. It is read at call time, so a token saved after startup
//! takes effect on the next classification. The hosted router
//! (`router.huggingface.co/hf-inference`) rejects requests without one.

use super::{ClassifierError, SentimentClassifier};
use crate::credentials::CredentialStore;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// Pipeline tag the hub reports for sentiment-style models
const TEXT_CLASSIFICATION: &str = "text-classification";

/// Subset of the hub's model metadata
#[derive(Debug, Deserialize)]
struct ModelInfo {
    #[serde(default)]
    pipeline_tag: Option<String>,
}

pub struct HuggingFaceClassifier {
    http_client: Client,
    model: String,
    hub_url: String,
    inference_url: String,
    credentials: CredentialStore,
}

impl HuggingFaceClassifier {
    pub fn new(
        http_client: Client,
        model: impl Into<String>,
        hub_url: impl Into<String>,
        inference_url: impl Into<String>,
        credentials: CredentialStore,
    ) -> Self {
        Self {
            http_client,
            model: model.into(),
            hub_url: hub_url.into().trim_end_matches('/').to_string(),
            inference_url: inference_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn model_info_url(&self) -> String {
        format!("{}/api/models/{}", self.hub_url, self.model)
    }

    fn inference_endpoint(&self) -> String {
        format!("{}/models/{}", self.inference_url, self.model)
    }

    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Wrap a flat prediction list (`[{label, score}]`) into the nested shape
///
/// The API returns the nested form for batched input and sometimes the flat
/// form for a single string. Anything else passes through untouched.
pub fn normalize_output(output: Value) -> Value {
    let is_flat = output
        .as_array()
        .and_then(|items| items.first())
        .map(Value::is_object)
        .unwrap_or(false);

    if is_flat {
        Value::Array(vec![output])
    } else {
        output
    }
}

#[async_trait]
impl SentimentClassifier for HuggingFaceClassifier {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn initialize(&self) -> Result<(), ClassifierError> {
        let url = self.model_info_url();
        debug!(model = %self.model, url = %url, "Checking model metadata");

        let response = self
            .authorize(self.http_client.get(&url))
            .await
            .send()
            .await
            .map_err(|e| ClassifierError::Network(format!("Model lookup failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ClassifierError::ModelUnavailable(format!(
                "{} (HTTP {})",
                self.model,
                response.status()
            )));
        }

        let info: ModelInfo = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(format!("Model metadata: {}", e)))?;

        match info.pipeline_tag.as_deref() {
            None | Some(TEXT_CLASSIFICATION) => Ok(()),
            Some(other) => Err(ClassifierError::ModelUnavailable(format!(
                "{} is a '{}' model, expected '{}'",
                self.model, other, TEXT_CLASSIFICATION
            ))),
        }
    }

    async fn classify(&self, text: &str) -> Result<Value, ClassifierError> {
        debug!(model = %self.model, text_length = text.len(), "Requesting classification");

        let request = self
            .http_client
            .post(self.inference_endpoint())
            .json(&json!({ "inputs": text }));

        let response = self
            .authorize(request)
            .await
            .send()
            .await
            .map_err(|e| ClassifierError::Network(format!("Inference request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let output: Value = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(format!("Inference response: {}", e)))?;

        Ok(normalize_output(output))
    }
}
