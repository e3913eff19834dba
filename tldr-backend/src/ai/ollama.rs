use crate::error::{BotError, BotResult};
use std::process::Stdio;
use tokio::process::Command;

/// Runs `<binary> run <model> <prompt>` and returns its stdout
#[derive(Debug, Clone)]
pub struct OllamaClient {
    binary: String,
    model: String,
}

impl OllamaClient {
    pub fn new(binary: &str, model: &str) -> BotResult<Self> {
        if model.trim().is_empty() {
            return Err(BotError::Config("Ollama model is empty".to_string()));
        }
        Ok(Self {
            binary: binary.to_string(),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_text(&self, prompt: &str) -> BotResult<String> {
        log::info!(
            "[OLLAMA] Running {} run {} ({} prompt chars)",
            self.binary,
            self.model,
            prompt.chars().count()
        );

        let output = Command::new(&self.binary)
            .arg("run")
            .arg(&self.model)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| BotError::Backend(format!("Failed to execute {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let mut message = format!("{} run {} failed: {}", self.binary, self.model, output.status);
            if !stderr.is_empty() {
                message.push_str(": ");
                message.push_str(stderr);
            }
            return Err(BotError::Backend(message));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
