//! Text generation capability boundary.
//!
//! [`GenerationClient`] talks to any OpenAI-compatible completions endpoint.
//! The orchestration loop only sees the [`TextGenerator`] trait, so tests can
//! substitute a mock and a run can survive individual call failures.

use crate::config::GenerationSettings;
use crate::error::{EvalError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Sampling parameters for one generation request.
#[derive(Debug, Clone, Serialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    /// Greedy decoding when false.
    pub do_sample: bool,
}

impl SamplingParams {
    /// Build sampling parameters from configuration.
    pub fn from_settings(settings: &GenerationSettings) -> Self {
        Self {
            temperature: settings.temperature,
            top_p: settings.top_p,
            do_sample: settings.do_sample,
        }
    }
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            do_sample: true,
        }
    }
}

/// A single generation request. Constructed fresh per item, never mutated.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The fully assembled prompt.
    pub prompt: String,
    /// Maximum number of new tokens the model may produce.
    pub max_new_tokens: u32,
    /// Sampling parameters.
    pub sampling: SamplingParams,
}

/// Outcome of one generation call.
///
/// A failed call carries its error description instead of aborting the run.
/// Keeping the marker (rather than collapsing failure into an empty string)
/// preserves the distinction between "the model produced nothing" and "the
/// call failed" for diagnostics.
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    /// The model produced raw text (prompt echo included).
    Completed { raw_text: String },
    /// The call failed; the run continues with an empty answer.
    Failed { error: String },
}

impl GenerationOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, GenerationOutcome::Failed { .. })
    }
}

/// Text generation capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one completion request.
    ///
    /// Underlying failures are converted into [`GenerationOutcome::Failed`],
    /// never propagated, so the caller can continue with remaining items.
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome;

    /// Maximum context length the model supports, in tokens.
    fn max_context_tokens(&self) -> u32;

    /// Identifier of the underlying model.
    fn model_id(&self) -> &str;
}

/// Request body for the completions endpoint.
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    prompt: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    /// Include the prompt in the returned text, matching the raw output the
    /// answer extractor expects.
    echo: bool,
}

/// Response from the completions endpoint.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

/// OpenAI API error response.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// OpenAI-compatible completions client.
#[derive(Clone)]
pub struct GenerationClient {
    client: Client,
    settings: GenerationSettings,
}

impl GenerationClient {
    /// Create a new generation client with the given settings.
    pub fn new(settings: GenerationSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    /// Get the API endpoint URL.
    fn endpoint(&self) -> String {
        let base = self.settings.api_base.trim_end_matches('/');
        format!("{}/v1/completions", base)
    }

    /// Send a completion request, propagating failures as errors.
    async fn complete(&self, request: &GenerationRequest) -> Result<String> {
        // Greedy decoding maps to temperature 0 on completion APIs.
        let (temperature, top_p) = if request.sampling.do_sample {
            (
                Some(request.sampling.temperature),
                Some(request.sampling.top_p),
            )
        } else {
            (Some(0.0), None)
        };

        let body = CompletionRequest {
            model: self.settings.model.clone(),
            prompt: request.prompt.clone(),
            max_tokens: request.max_new_tokens,
            temperature,
            top_p,
            echo: true,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.settings.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // Try to parse as API error
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&text) {
                return Err(EvalError::GenerationApi(format!(
                    "API error ({}): {}",
                    status, api_error.error.message
                )));
            }
            return Err(EvalError::GenerationApi(format!(
                "Request failed ({}): {}",
                status, text
            )));
        }

        let completion: CompletionResponse = serde_json::from_str(&text)?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| EvalError::GenerationApi("No choices in response".to_string()))?;

        Ok(choice.text)
    }

    /// Test connectivity to the API with a trivial request.
    pub async fn probe(&self) -> Result<()> {
        let request = GenerationRequest {
            prompt: "Say 'hello' and nothing else.\nAnswer:".to_string(),
            max_new_tokens: 16,
            sampling: SamplingParams {
                temperature: 0.0,
                top_p: 1.0,
                do_sample: false,
            },
        };

        let text = self.complete(&request).await?;

        if text.trim().is_empty() {
            Err(EvalError::GenerationApi(
                "Probe returned empty completion".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        match self.complete(request).await {
            Ok(raw_text) => GenerationOutcome::Completed { raw_text },
            Err(e) => GenerationOutcome::Failed {
                error: e.to_string(),
            },
        }
    }

    fn max_context_tokens(&self) -> u32 {
        self.settings.max_model_tokens
    }

    fn model_id(&self) -> &str {
        &self.settings.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings(api_base: &str) -> GenerationSettings {
        GenerationSettings {
            api_base: api_base.to_string(),
            api_key: "test".to_string(),
            model: "qwen".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_endpoint_construction() {
        let client = GenerationClient::new(test_settings("https://api.example.com/"));
        assert_eq!(client.endpoint(), "https://api.example.com/v1/completions");

        // Without trailing slash
        let client2 = GenerationClient::new(test_settings("https://api.example.com"));
        assert_eq!(client2.endpoint(), "https://api.example.com/v1/completions");
    }

    #[test]
    fn test_sampling_params_from_settings() {
        let mut settings = test_settings("https://api.example.com");
        settings.temperature = 0.3;
        settings.top_p = 0.5;
        settings.do_sample = false;

        let sampling = SamplingParams::from_settings(&settings);
        assert_eq!(sampling.temperature, 0.3);
        assert_eq!(sampling.top_p, 0.5);
        assert!(!sampling.do_sample);
    }

    #[test]
    fn test_outcome_is_failed() {
        let ok = GenerationOutcome::Completed {
            raw_text: "text".to_string(),
        };
        let failed = GenerationOutcome::Failed {
            error: "timeout".to_string(),
        };
        assert!(!ok.is_failed());
        assert!(failed.is_failed());
    }

    #[test]
    fn test_trait_exposes_model_properties() {
        let mut settings = test_settings("https://api.example.com");
        settings.max_model_tokens = 4096;
        let client = GenerationClient::new(settings);

        assert_eq!(client.max_context_tokens(), 4096);
        assert_eq!(client.model_id(), "qwen");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_failed_outcome() {
        // Port 9 (discard) refuses connections; the failure must surface as
        // an outcome marker, not an Err.
        let client = GenerationClient::new(test_settings("http://127.0.0.1:9"));
        let request = GenerationRequest {
            prompt: "Question: Q?\nAnswer:".to_string(),
            max_new_tokens: 8,
            sampling: SamplingParams::default(),
        };

        let outcome = client.generate(&request).await;
        assert!(outcome.is_failed());
    }
}
