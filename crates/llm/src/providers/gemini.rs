//! Gemini LLM provider implementation.
//!
//! Talks to the Google Generative Language REST API (`generateContent`).

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use consult_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Gemini LLM client.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client against the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint (proxies, test servers).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn to_gemini_request(&self, request: &LlmRequest) -> GenerateContentRequest {
        // repeat_penalty has no Gemini counterpart
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.options.temperature,
                top_k: request.options.top_k,
                top_p: request.options.top_p,
                max_output_tokens: request.options.max_tokens,
            },
        }
    }

    fn convert_response(
        &self,
        model: &str,
        response: GenerateContentResponse,
    ) -> AppResult<LlmResponse> {
        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            AppError::GenerationUnavailable("Gemini returned no candidates".to_string())
        })?;

        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = response
            .usage_metadata
            .map(|u| LlmUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: model.to_string(),
            usage,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(model = %request.model, "Sending completion request to Gemini");

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            request.model.trim_start_matches("models/")
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.to_gemini_request(request))
            .send()
            .await
            .map_err(|e| {
                AppError::GenerationUnavailable(format!("Failed to send request to Gemini: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::GenerationUnavailable(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            AppError::GenerationUnavailable(format!("Failed to parse Gemini response: {}", e))
        })?;

        self.convert_response(&request.model, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GenerationOptions;

    #[test]
    fn test_request_shape() {
        let client = GeminiClient::new("key");
        let request = LlmRequest::new("What is a franchise fee?", "gemini-1.5-pro").with_options(
            GenerationOptions {
                max_tokens: Some(128),
                ..GenerationOptions::default()
            },
        );

        let json = serde_json::to_value(client.to_gemini_request(&request)).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["contents"][0]["parts"][0]["text"],
            "What is a franchise fee?"
        );
        assert!(json.get("systemInstruction").is_none());
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 128);
        assert!(json["generationConfig"].get("repeatPenalty").is_none());
    }

    #[test]
    fn test_response_joins_parts() {
        let client = GeminiClient::new("key");
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Royalty "}, {"text": "fees apply."}]}}],
                "usageMetadata": {"promptTokenCount": 7, "candidatesTokenCount": 3}
            }"#,
        )
        .unwrap();

        let response = client.convert_response("gemini-1.5-pro", body).unwrap();
        assert_eq!(response.content, "Royalty fees apply.");
        assert_eq!(response.usage.total_tokens, 10);
    }

    #[test]
    fn test_no_candidates_is_unavailable() {
        let client = GeminiClient::new("key");
        let body: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        let result = client.convert_response("gemini-1.5-pro", body);
        assert!(matches!(result, Err(AppError::GenerationUnavailable(_))));
    }
}
