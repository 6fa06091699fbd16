//! Generative-model scoring backend.
//!
//! One blocking request per transaction. Transport failure means the
//! backend is unreachable and is fatal for the run; a response that
//! arrives but does not parse degrades to UNKNOWN in-row.

use crate::{
    config::GenerativeConfig,
    error::{PipelineError, PipelineResult},
    prompt::PromptRow,
    verdict::{parse_generative_verdict, Verdict},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct GenerationRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub temperature: f64,
    pub max_output_tokens: u32,
    /// Response-format hint; always "json" for verdict requests.
    pub response_format: &'a str,
}

/// Seam to the hosted model. The response is the model's raw text,
/// expected (but not guaranteed) to parse as a strict-JSON verdict.
pub trait GenerativeClient {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, String>;
}

pub struct HttpGenerativeClient {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpGenerativeClient {
    pub fn new(cfg: &GenerativeConfig) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
        })
    }
}

impl GenerativeClient for HttpGenerativeClient {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, String> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }
        response.text().map_err(|e| e.to_string())
    }
}

pub struct GenerativeScorer<'a> {
    client: &'a dyn GenerativeClient,
    cfg: GenerativeConfig,
}

impl<'a> GenerativeScorer<'a> {
    pub fn new(client: &'a dyn GenerativeClient, cfg: GenerativeConfig) -> Self {
        Self { client, cfg }
    }

    pub fn score(&self, prompt: &PromptRow) -> PipelineResult<Verdict> {
        let request = GenerationRequest {
            model: &self.cfg.model,
            prompt: &prompt.prompt,
            temperature: self.cfg.temperature,
            max_output_tokens: self.cfg.max_output_tokens,
            response_format: "json",
        };
        let raw = self
            .client
            .generate(&request)
            .map_err(|reason| PipelineError::ModelUnavailable {
                backend: "generative",
                reason,
            })?;
        let verdict = parse_generative_verdict(&prompt.transaction_id, &raw);
        if verdict.reasons.iter().any(|r| r == crate::verdict::PARSE_ERROR_REASON) {
            log::warn!(
                "transaction '{}': generative output did not parse, degraded to UNKNOWN",
                prompt.transaction_id
            );
        }
        Ok(verdict)
    }
}
