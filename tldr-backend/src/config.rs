use crate::error::{BotError, BotResult};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const CONFIG_PATH: &str = "TLDR_CONFIG_PATH";
    pub const MASTODON_SERVER: &str = "MASTODON_SERVER";
    pub const MASTODON_ACCESS_TOKEN: &str = "MASTODON_ACCESS_TOKEN";
    /// Bot handle; when set, mentions from this account are ignored
    pub const MASTODON_USERNAME: &str = "MASTODON_USERNAME";
    pub const LLM_PROVIDER: &str = "LLM_PROVIDER";
    pub const OLLAMA_MODEL: &str = "OLLAMA_MODEL";
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
}

/// Default values
pub mod defaults {
    pub const CONFIG_PATH: &str = "config.toml";
    pub const GEMINI_MODEL: &str = "gemini-1.5-flash";
    pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
    pub const OLLAMA_BINARY: &str = "ollama";
}

/// Text-generation provider selected in `[llm] provider`
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LlmProvider {
    Gemini,
    Ollama,
}

/// `[server]` section. Other keys from app registration (`client_secret`,
/// `client_id`) are accepted and ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub mastodon_server: String,
    pub access_token: String,
    pub bot_handle: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: String,
    pub ollama_model: String,
    pub ollama_binary: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub gemini: GeminiSettings,
}

impl Config {
    /// Load config from the TOML file named by `TLDR_CONFIG_PATH` (default
    /// `config.toml`), apply environment overrides, then validate.
    pub fn load() -> BotResult<Self> {
        let path = env::var(env_vars::CONFIG_PATH)
            .unwrap_or_else(|_| defaults::CONFIG_PATH.to_string());

        let mut config = if Path::new(&path).exists() {
            log::info!("Loading config from {}", path);
            Self::from_file(Path::new(&path))?
        } else {
            log::warn!("Config file {} not found, using environment only", path);
            Self::default()
        };

        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> BotResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BotError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> BotResult<Self> {
        toml::from_str(raw).map_err(|e| BotError::Config(format!("Invalid config: {}", e)))
    }

    /// Override file values with any non-empty variable returned by `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(env_vars::MASTODON_SERVER) {
            self.server.mastodon_server = v;
        }
        if let Some(v) = get(env_vars::MASTODON_ACCESS_TOKEN) {
            self.server.access_token = v;
        }
        if let Some(v) = get(env_vars::MASTODON_USERNAME) {
            self.server.bot_handle = Some(v);
        }
        if let Some(v) = get(env_vars::LLM_PROVIDER) {
            self.llm.provider = v;
        }
        if let Some(v) = get(env_vars::OLLAMA_MODEL) {
            self.llm.ollama_model = v;
        }
        if let Some(v) = get(env_vars::GEMINI_API_KEY) {
            self.gemini.api_key = v;
        }
    }

    pub fn validate(&self) -> BotResult<()> {
        if self.server.mastodon_server.trim().is_empty() {
            return Err(BotError::Config("server.mastodon_server is not set".to_string()));
        }
        url::Url::parse(&self.server.mastodon_server).map_err(|e| {
            BotError::Config(format!(
                "Invalid server.mastodon_server '{}': {}",
                self.server.mastodon_server, e
            ))
        })?;
        if self.server.access_token.trim().is_empty() {
            return Err(BotError::Config("server.access_token is not set".to_string()));
        }

        match self.provider()? {
            LlmProvider::Gemini if self.gemini.api_key.trim().is_empty() => Err(
                BotError::Config("gemini.api_key is required for the gemini provider".to_string()),
            ),
            LlmProvider::Ollama if self.llm.ollama_model.trim().is_empty() => Err(
                BotError::Config("llm.ollama_model is required for the ollama provider".to_string()),
            ),
            _ => Ok(()),
        }
    }

    pub fn provider(&self) -> BotResult<LlmProvider> {
        LlmProvider::from_str(self.llm.provider.trim()).map_err(|_| {
            BotError::Config(format!("unsupported LLM provider: {}", self.llm.provider))
        })
    }

    /// Configured bot handle without a leading '@'
    pub fn bot_handle(&self) -> Option<String> {
        self.server
            .bot_handle
            .as_deref()
            .map(|h| h.trim().trim_start_matches('@').to_string())
            .filter(|h| !h.is_empty())
    }

    pub fn gemini_model(&self) -> &str {
        self.gemini.model.as_deref().unwrap_or(defaults::GEMINI_MODEL)
    }

    pub fn gemini_api_base(&self) -> &str {
        self.gemini
            .api_base
            .as_deref()
            .unwrap_or(defaults::GEMINI_API_BASE)
    }

    pub fn ollama_binary(&self) -> &str {
        self.llm
            .ollama_binary
            .as_deref()
            .unwrap_or(defaults::OLLAMA_BINARY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const SAMPLE: &str = r#"
[server]
mastodon_server = "https://mastodon.example"
client_secret = "secret"
access_token = "token"

[llm]
provider = "gemini"
ollama_model = "llama3"

[gemini]
api_key = "gem-key"
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.server.mastodon_server, "https://mastodon.example");
        assert_eq!(config.provider().unwrap(), LlmProvider::Gemini);
        assert_eq!(config.gemini_model(), defaults::GEMINI_MODEL);
        assert_eq!(config.ollama_binary(), "ollama");
        assert!(config.bot_handle().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unused_server_keys_are_ignored() {
        let config = Config::from_toml_str(
            "[server]\nmastodon_server = \"https://m.example\"\nclient_secret = \"s\"\naccess_token = \"t\"\nclient_id = \"c\"\n",
        )
        .unwrap();
        assert_eq!(config.server.access_token, "t");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.access_token, "token");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml_str("[server\nbroken").unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
    }

    #[test]
    fn test_provider_names_are_case_insensitive() {
        assert_eq!(LlmProvider::from_str("Ollama").unwrap(), LlmProvider::Ollama);
        assert_eq!(LlmProvider::from_str("GEMINI").unwrap(), LlmProvider::Gemini);
        assert_eq!(LlmProvider::Ollama.as_ref(), "ollama");
    }

    #[test]
    fn test_unsupported_provider() {
        let mut config = Config::from_toml_str(SAMPLE).unwrap();
        config.llm.provider = "gpt".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err,
            BotError::Config("unsupported LLM provider: gpt".to_string())
        );
    }

    #[test]
    fn test_missing_credentials_fail_validation() {
        let mut config = Config::from_toml_str(SAMPLE).unwrap();
        config.server.access_token.clear();
        assert!(config.validate().is_err());

        let mut config = Config::from_toml_str(SAMPLE).unwrap();
        config.gemini.api_key.clear();
        assert!(config.validate().is_err());

        let mut config = Config::from_toml_str(SAMPLE).unwrap();
        config.llm.provider = "ollama".to_string();
        config.llm.ollama_model.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::from_toml_str(SAMPLE).unwrap();
        let vars: HashMap<&str, &str> = HashMap::from([
            (env_vars::MASTODON_USERNAME, "@TldrBot"),
            (env_vars::LLM_PROVIDER, "ollama"),
            (env_vars::OLLAMA_MODEL, "mistral"),
            (env_vars::GEMINI_API_KEY, ""),
        ]);
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.bot_handle().as_deref(), Some("TldrBot"));
        assert_eq!(config.provider().unwrap(), LlmProvider::Ollama);
        assert_eq!(config.llm.ollama_model, "mistral");
        // Empty values never clobber the file
        assert_eq!(config.gemini.api_key, "gem-key");
    }
}
