use crate::config::defaults;
use crate::error::{BotError, BotResult};
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    auth_headers: header::HeaderMap,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, api_base: Option<&str>, model: Option<&str>) -> BotResult<Self> {
        if api_key.trim().is_empty() {
            return Err(BotError::Config("Gemini API key is empty".to_string()));
        }

        let mut auth_headers = header::HeaderMap::new();
        auth_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let key_value = header::HeaderValue::from_str(api_key)
            .map_err(|e| BotError::Config(format!("Invalid API key format: {}", e)))?;
        auth_headers.insert("x-goog-api-key", key_value);

        let model = match model {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => defaults::GEMINI_MODEL.to_string(),
        };
        let base = api_base
            .unwrap_or(defaults::GEMINI_API_BASE)
            .trim_end_matches('/');

        Ok(Self {
            client: crate::http::shared_client().clone(),
            auth_headers,
            endpoint: format!("{}/v1beta/models/{}:generateContent", base, model),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_text(&self, prompt: &str) -> BotResult<String> {
        let request = GenerateContentRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
                role: Some("user".to_string()),
            }],
        };

        log::info!(
            "[GEMINI] Sending request with model {} ({} prompt chars)",
            self.model,
            prompt.chars().count()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.auth_headers.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Backend(format!("Gemini API request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BotError::Backend(format!("Failed to read Gemini response: {}", e)))?;

        if !status.is_success() {
            let error_msg = match serde_json::from_str::<GeminiErrorResponse>(&body) {
                Ok(error_response) => format!("Gemini API error: {}", error_response.error.message),
                Err(_) => {
                    let truncated = if body.len() > 200 {
                        format!("{}...", body.chars().take(200).collect::<String>())
                    } else {
                        body.clone()
                    };
                    format!("Gemini API returned error status: {}, body: {}", status, truncated)
                }
            };
            return Err(BotError::Backend(error_msg));
        }

        log::debug!("[GEMINI] Raw response:\n{}", body);

        let data: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            BotError::Backend(format!("Failed to parse Gemini response: {}", e))
        })?;

        if data.candidates.is_empty() {
            log::warn!(
                "[GEMINI] Response had no candidates (block reason: {})",
                data.prompt_feedback
                    .and_then(|f| f.block_reason)
                    .unwrap_or_else(|| "none".to_string())
            );
        }

        let text = collect_candidate_text(&data.candidates);
        log::info!(
            "[GEMINI] Response - {} candidate(s), {} chars, finish_reason: {:?}",
            data.candidates.len(),
            text.len(),
            data.candidates.first().and_then(|c| c.finish_reason.as_deref())
        );
        Ok(text)
    }
}

/// Text of every part of every candidate, in order
fn collect_candidate_text(candidates: &[GeminiCandidate]) -> String {
    candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(matches!(
            GeminiClient::new("  ", None, None),
            Err(BotError::Config(_))
        ));
    }

    #[test]
    fn test_collect_candidate_text_concatenates_all_parts() {
        let data: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Hello" }, { "text": ", " }] } },
                { "content": { "parts": [{ "functionCall": {} }, { "text": "world" }] } },
                { "finishReason": "SAFETY" }
            ]
        }))
        .unwrap();
        assert_eq!(collect_candidate_text(&data.candidates), "Hello, world");
    }

    #[tokio::test]
    async fn test_generate_text_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "contents": [{ "parts": [{ "text": "summarize me" }] }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{
                        "content": { "role": "model", "parts": [{ "text": "TL;DR: " }, { "text": "short." }] },
                        "finishReason": "STOP"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = GeminiClient::new("test-key", Some(&server.url()), None).unwrap();
        let text = client.generate_text("summarize me").await.unwrap();
        assert_eq!(text, "TL;DR: short.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_text_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(429)
            .with_body(
                json!({ "error": { "code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED" } })
                    .to_string(),
            )
            .create_async()
            .await;

        let client = GeminiClient::new("test-key", Some(&server.url()), None).unwrap();
        let err = client.generate_text("x").await.unwrap_err();
        assert_eq!(
            err,
            BotError::Backend("Gemini API error: Quota exceeded".to_string())
        );
    }

    #[tokio::test]
    async fn test_blocked_prompt_yields_empty_text() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-pro:generateContent")
            .with_status(200)
            .with_body(json!({ "promptFeedback": { "blockReason": "SAFETY" } }).to_string())
            .create_async()
            .await;

        let client =
            GeminiClient::new("test-key", Some(&format!("{}/", server.url())), Some("gemini-pro"))
                .unwrap();
        assert_eq!(client.model(), "gemini-pro");
        assert_eq!(client.generate_text("x").await.unwrap(), "");
    }
}
