pub mod gemini;
pub mod ollama;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

use crate::config::{Config, LlmProvider};
use crate::error::{BotError, BotResult};
use crate::summarizer::GenerationRequest;

#[cfg(test)]
use std::collections::VecDeque;
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// Mock generation backend for tests: returns queued results in order and
/// records every prompt it receives.
#[cfg(test)]
#[derive(Clone)]
pub struct MockLlmClient {
    responses: Arc<Mutex<VecDeque<BotResult<String>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

#[cfg(test)]
impl MockLlmClient {
    pub fn new(responses: Vec<BotResult<String>>) -> Self {
        MockLlmClient {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn next_response(&self, prompt: &str) -> BotResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("(mock exhausted)".to_string()))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

/// Generation backend, selected once at startup from `[llm] provider`
pub enum LlmClient {
    Gemini(GeminiClient),
    Ollama(OllamaClient),
    #[cfg(test)]
    Mock(MockLlmClient),
}

impl LlmClient {
    pub fn from_config(config: &Config) -> BotResult<Self> {
        match config.provider()? {
            LlmProvider::Gemini => {
                let client = GeminiClient::new(
                    &config.gemini.api_key,
                    Some(config.gemini_api_base()),
                    Some(config.gemini_model()),
                )?;
                Ok(LlmClient::Gemini(client))
            }
            LlmProvider::Ollama => {
                let client = OllamaClient::new(config.ollama_binary(), &config.llm.ollama_model)?;
                Ok(LlmClient::Ollama(client))
            }
        }
    }

    pub fn provider(&self) -> LlmProvider {
        match self {
            LlmClient::Gemini(_) => LlmProvider::Gemini,
            LlmClient::Ollama(_) => LlmProvider::Ollama,
            #[cfg(test)]
            LlmClient::Mock(_) => LlmProvider::Gemini,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            LlmClient::Gemini(c) => c.model(),
            LlmClient::Ollama(c) => c.model(),
            #[cfg(test)]
            LlmClient::Mock(_) => "mock",
        }
    }

    /// Run a generation request against the configured backend.
    ///
    /// A request addressed to a provider other than the configured one fails
    /// with `BotError::Config`.
    pub async fn generate(&self, request: &GenerationRequest) -> BotResult<String> {
        if request.provider != self.provider() {
            return Err(BotError::Config(format!(
                "unsupported LLM provider: {} (configured: {})",
                request.provider,
                self.provider()
            )));
        }

        match self {
            LlmClient::Gemini(client) => client.generate_text(&request.prompt).await,
            LlmClient::Ollama(client) => client.generate_text(&request.prompt).await,
            #[cfg(test)]
            LlmClient::Mock(client) => client.next_response(&request.prompt),
        }
    }
}
